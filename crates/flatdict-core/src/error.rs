//! Error handling for the flat dictionary
//!
//! Load-time errors abort construction entirely; query-time errors only affect the call
//! that raised them. None of them are transient, so nothing in this crate retries.

use flatdict_types::AttributeType;
use std::fmt;
use thiserror::Error;

/// Error type for dictionary construction and lookup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DictionaryError {
    /// Attribute name not present in the dictionary structure
    #[error("No such attribute '{name}'")]
    UnknownAttribute { name: String },

    /// Requested type differs from the stored type, or the hierarchy is not integer-typed
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String, attribute: Option<String>, actual: AttributeType },

    /// Identifier at or above the configured ceiling during load
    #[error("Identifier should be less than {max_array_size}, got {id}")]
    IdOutOfBound { id: u64, max_array_size: usize, attribute: Option<String> },

    /// Null value text cannot be parsed as the declared type
    #[error("Cannot parse null value '{text}' of attribute '{attribute}' as {expected}: {reason}")]
    ValueParseError { attribute: String, expected: AttributeType, text: String, reason: String },

    /// Array or arena allocation failed
    #[error("Allocation of {requested_bytes} bytes failed for {component}")]
    AllocationFailure { component: String, requested_bytes: usize },

    /// `to_parent` called on a dictionary without a hierarchical attribute
    #[error("Dictionary has no hierarchical attribute")]
    NoHierarchy,

    /// Block shape does not match the dictionary structure
    #[error("Malformed block: {message}")]
    MalformedBlock { message: String, block_index: usize },

    /// Structure or limits configuration is invalid
    #[error("Invalid dictionary structure: {message}")]
    InvalidStructure { message: String, setting: Option<String> },

    /// The row source failed while producing blocks
    #[error("Dictionary source error: {message}")]
    Source { message: String },
}

impl DictionaryError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            DictionaryError::UnknownAttribute { .. } => "unknown_attribute",
            DictionaryError::TypeMismatch { .. } => "type_mismatch",
            DictionaryError::IdOutOfBound { .. } => "id_out_of_bound",
            DictionaryError::ValueParseError { .. } => "value_parse",
            DictionaryError::AllocationFailure { .. } => "allocation",
            DictionaryError::NoHierarchy => "no_hierarchy",
            DictionaryError::MalformedBlock { .. } => "malformed_block",
            DictionaryError::InvalidStructure { .. } => "configuration",
            DictionaryError::Source { .. } => "source",
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DictionaryError::UnknownAttribute { .. } => ErrorSeverity::Medium,
            DictionaryError::TypeMismatch { .. } => ErrorSeverity::Medium,
            DictionaryError::NoHierarchy => ErrorSeverity::Medium,
            DictionaryError::IdOutOfBound { .. } => ErrorSeverity::High,
            DictionaryError::ValueParseError { .. } => ErrorSeverity::High,
            DictionaryError::MalformedBlock { .. } => ErrorSeverity::High,
            DictionaryError::Source { .. } => ErrorSeverity::High,
            DictionaryError::InvalidStructure { .. } => ErrorSeverity::Critical,
            DictionaryError::AllocationFailure { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether the dictionary stays usable after this error.
    ///
    /// Query-time errors leave the loaded structure intact; anything raised while
    /// loading means no instance exists.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DictionaryError::UnknownAttribute { .. }
                | DictionaryError::TypeMismatch { .. }
                | DictionaryError::NoHierarchy
        )
    }
}

/// Error severity levels for logging and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Result type alias for dictionary operations
pub type DictionaryResult<T> = Result<T, DictionaryError>;

/// Convenience constructors for common error scenarios
impl DictionaryError {
    /// Create an unknown attribute error
    pub fn unknown_attribute(name: &str) -> Self {
        Self::UnknownAttribute { name: name.to_string() }
    }

    /// Create a getter type mismatch error
    pub fn type_mismatch(attribute: &str, actual: AttributeType) -> Self {
        Self::TypeMismatch {
            message: format!("attribute {attribute} has type {actual}"),
            attribute: Some(attribute.to_string()),
            actual,
        }
    }

    /// Create a hierarchy type mismatch error
    pub fn non_integer_hierarchy(actual: AttributeType) -> Self {
        Self::TypeMismatch {
            message: format!("hierarchical attribute has non-integer type {actual}"),
            attribute: None,
            actual,
        }
    }

    /// Create a type mismatch error for a source cell that cannot be stored
    pub fn incompatible_field(attribute: &str, actual: AttributeType, field_type: &str) -> Self {
        Self::TypeMismatch {
            message: format!(
                "attribute {attribute} has type {actual}, source provided a {field_type} value"
            ),
            attribute: Some(attribute.to_string()),
            actual,
        }
    }

    /// Create an identifier bound error
    pub fn id_out_of_bound(id: u64, max_array_size: usize) -> Self {
        Self::IdOutOfBound { id, max_array_size, attribute: None }
    }

    /// Create a null value parse error
    pub fn value_parse(
        attribute: &str,
        expected: AttributeType,
        text: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::ValueParseError {
            attribute: attribute.to_string(),
            expected,
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an allocation failure error
    pub fn allocation(component: &str, requested_bytes: usize) -> Self {
        Self::AllocationFailure { component: component.to_string(), requested_bytes }
    }

    /// Create a malformed block error
    pub fn malformed_block(block_index: usize, message: impl Into<String>) -> Self {
        Self::MalformedBlock { message: message.into(), block_index }
    }

    /// Create an invalid structure error
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure { message: message.into(), setting: None }
    }

    /// Create an invalid setting error
    pub fn invalid_setting(setting: &str, message: impl Into<String>) -> Self {
        Self::InvalidStructure { message: message.into(), setting: Some(setting.to_string()) }
    }
}

/// Convert a source-side failure into a dictionary error
impl From<anyhow::Error> for DictionaryError {
    fn from(err: anyhow::Error) -> Self {
        DictionaryError::Source { message: format!("{err:#}") }
    }
}

impl From<std::io::Error> for DictionaryError {
    fn from(err: std::io::Error) -> Self {
        DictionaryError::Source { message: format!("I/O error: {err}") }
    }
}

impl From<toml::de::Error> for DictionaryError {
    fn from(err: toml::de::Error) -> Self {
        DictionaryError::invalid_structure(format!("TOML error: {err}"))
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach the attribute being loaded to a bound error
    fn with_attribute_context(self, attribute: &str) -> DictionaryResult<T>;
}

impl<T> ResultExt<T> for DictionaryResult<T> {
    fn with_attribute_context(self, attribute: &str) -> DictionaryResult<T> {
        self.map_err(|mut err| {
            if let DictionaryError::IdOutOfBound { attribute: name, .. } = &mut err {
                *name = Some(attribute.to_string());
            }
            err
        })
    }
}
