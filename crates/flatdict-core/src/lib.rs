#![allow(missing_docs)]
//! Flat, array-backed dictionary for integer-keyed reference data.
//!
//! A dictionary is loaded once from a [`DictionarySource`] and then serves lookups by
//! direct array indexing: every attribute is a dense column addressed by the row's
//! identifier, with string values packed into a chunked arena. Lookups never allocate
//! and never lock, so a built [`FlatDictionary`] can be shared freely between threads.

/// Chunked append-only storage for string attribute values
pub mod arena;
/// Rust type to attribute type mapping for generic getters
pub mod attribute;
/// Dense per-attribute value arrays
pub mod column;
/// Dictionary structure, limits and TOML configuration
pub mod config;
/// Default limits, arena sizing and environment variable names
pub mod constants;
/// Loaded dictionary and its lookup API
pub mod dictionary;
/// Error types and result helpers
pub mod error;
/// Bulk loading of sources into attribute tables
pub mod loader;
/// Block streams feeding a load
pub mod source;
/// Ordered attribute columns with name lookup
pub mod table;

pub use attribute::Attribute;
pub use config::{AttributeDescriptor, DictionaryConfig, DictionaryLimits, DictionaryStructure};
pub use dictionary::{DictionaryStats, FlatDictionary};
pub use error::{DictionaryError, DictionaryResult, ErrorSeverity, ResultExt};
pub use source::{Block, BlockStream, DictionarySource, MemorySource};

pub use flatdict_types::{AttributeType, AttributeValue, Field};
