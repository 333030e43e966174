//! Compile-time mapping from Rust types to attribute storage types
//!
//! [`Attribute`] is implemented for exactly the supported kinds: the eight integer
//! types, `f32`, `f64` and `str`. The dictionary's getters are generic over it, so a
//! single function serves every type and the column's stored tag decides the match arm.

use crate::column::ColumnData;
use flatdict_types::AttributeType;

mod sealed {
    pub trait Sealed {}
}

/// A Rust type that can be read out of a dictionary attribute
pub trait Attribute: sealed::Sealed {
    /// Storage type this Rust type reads from
    const TYPE: AttributeType;

    /// What a lookup hands back: the value itself for numbers, a borrowed slice for strings
    type Value<'a>: Copy;

    /// Read `id` from `data`, `None` if `data` holds a different type
    fn read(data: &ColumnData, id: u64) -> Option<Self::Value<'_>>;

    /// Placeholder returned by unchecked reads that name the wrong type
    fn fallback<'a>() -> Self::Value<'a>;
}

macro_rules! numeric_attribute {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Attribute for $ty {
                const TYPE: AttributeType = AttributeType::$variant;

                type Value<'a> = $ty;

                #[inline]
                fn read(data: &ColumnData, id: u64) -> Option<$ty> {
                    match data {
                        ColumnData::$variant(array) => Some(array.get(id)),
                        _ => None,
                    }
                }

                fn fallback<'a>() -> Self::Value<'a> {
                    <$ty>::default()
                }
            }
        )*
    };
}

numeric_attribute! {
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

impl sealed::Sealed for str {}

impl Attribute for str {
    const TYPE: AttributeType = AttributeType::String;

    type Value<'a> = &'a str;

    #[inline]
    fn read(data: &ColumnData, id: u64) -> Option<&str> {
        match data {
            ColumnData::String(array) => Some(array.get(id)),
            _ => None,
        }
    }

    fn fallback<'a>() -> &'a str {
        ""
    }
}
