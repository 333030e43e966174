use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use std::str::FromStr;

/// Storage type of a dictionary attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeType {
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point number
    Float32,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string backed by an arena
    String,
}

impl AttributeType {
    /// Every supported attribute type, in declaration order
    pub const ALL: [Self; 11] = [
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::String,
    ];

    /// Canonical type name as it appears in dictionary structure configuration
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeType {
    type Err = anyhow::Error;

    /// Accepts canonical names (`UInt32`) as well as their lowercase spelling (`uint32`)
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("Unknown attribute type '{s}'"))
    }
}

impl<'de> Deserialize<'de> for AttributeType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// A single cell streamed by a dictionary source while loading.
///
/// Sources hand over values in their widest representation; the loader narrows them
/// to the attribute's storage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    /// Unsigned integer cell
    UInt64(u64),
    /// Signed integer cell
    Int64(i64),
    /// Floating point cell
    Float64(f64),
    /// String cell
    String(String),
}

impl Field {
    /// Get the kind name of this cell
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::UInt64(_) => "UInt64",
            Self::Int64(_) => "Int64",
            Self::Float64(_) => "Float64",
            Self::String(_) => "String",
        }
    }

    /// Read the cell as an unsigned integer, reinterpreting other numeric kinds
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt64(v) => Some(*v),
            Self::Int64(v) => Some(*v as u64),
            Self::Float64(v) => Some(*v as u64),
            Self::String(_) => None,
        }
    }

    /// Read the cell as a signed integer, reinterpreting other numeric kinds
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::UInt64(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::Float64(v) => Some(*v as i64),
            Self::String(_) => None,
        }
    }

    /// Read the cell as a float
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::UInt64(v) => Some(*v as f64),
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            Self::String(_) => None,
        }
    }

    /// Borrow the cell as a string slice
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u8> for Field {
    fn from(value: u8) -> Self {
        Self::UInt64(u64::from(value))
    }
}

impl From<u16> for Field {
    fn from(value: u16) -> Self {
        Self::UInt64(u64::from(value))
    }
}

impl From<u32> for Field {
    fn from(value: u32) -> Self {
        Self::UInt64(u64::from(value))
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Self::UInt64(value)
    }
}

impl From<i8> for Field {
    fn from(value: i8) -> Self {
        Self::Int64(i64::from(value))
    }
}

impl From<i16> for Field {
    fn from(value: i16) -> Self {
        Self::Int64(i64::from(value))
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Self::Int64(i64::from(value))
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f32> for Field {
    fn from(value: f32) -> Self {
        Self::Float64(f64::from(value))
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A value read back out of a loaded dictionary, tagged with its storage type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue<'a> {
    /// 8-bit unsigned integer
    UInt8(u8),
    /// 16-bit unsigned integer
    UInt16(u16),
    /// 32-bit unsigned integer
    UInt32(u32),
    /// 64-bit unsigned integer
    UInt64(u64),
    /// 8-bit signed integer
    Int8(i8),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// String borrowed from the dictionary's arena
    String(&'a str),
}

impl fmt::Display for AttributeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}
