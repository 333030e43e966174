//! Flat dictionary types
//!
//! This crate defines the value types shared by the flat dictionary crates: the closed
//! set of attribute storage types, the cells a dictionary source streams while loading,
//! and the tagged values read back out of a loaded dictionary.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]

mod types;
pub use types::{AttributeType, AttributeValue, Field};
