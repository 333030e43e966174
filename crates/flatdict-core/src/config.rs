use crate::constants::{env, limits};
use crate::error::{DictionaryError, DictionaryResult};
use flatdict_types::AttributeType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Capacity limits injected into every dictionary at construction
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryLimits {
    /// Exclusive upper bound for identifiers; numeric arrays are sized to exactly this
    #[serde(default = "default_max_array_size")]
    pub max_array_size: usize,
    /// Initial length of string reference arrays
    #[serde(default = "default_initial_array_size")]
    pub initial_array_size: usize,
}

impl Default for DictionaryLimits {
    fn default() -> Self {
        Self {
            max_array_size: default_max_array_size(),
            initial_array_size: default_initial_array_size(),
        }
    }
}

impl DictionaryLimits {
    pub fn new(max_array_size: usize, initial_array_size: usize) -> Self {
        Self { max_array_size, initial_array_size }
    }

    pub fn validate(&self) -> DictionaryResult<()> {
        if self.max_array_size == 0 {
            return Err(DictionaryError::invalid_setting(
                "max_array_size",
                "max_array_size must be at least 1",
            ));
        }
        if self.initial_array_size == 0 {
            return Err(DictionaryError::invalid_setting(
                "initial_array_size",
                "initial_array_size must be at least 1",
            ));
        }
        if self.initial_array_size > self.max_array_size {
            return Err(DictionaryError::invalid_setting(
                "initial_array_size",
                format!(
                    "initial_array_size ({}) exceeds max_array_size ({})",
                    self.initial_array_size, self.max_array_size
                ),
            ));
        }
        Ok(())
    }

    /// Apply `FLATDICT_*` environment overrides, ignoring unparsable values
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(env::MAX_ARRAY_SIZE) {
            match value.parse::<usize>() {
                Ok(size) => self.max_array_size = size,
                Err(_) => warn!(variable = env::MAX_ARRAY_SIZE, %value, "Ignoring unparsable override"),
            }
        }
        if let Ok(value) = std::env::var(env::INITIAL_ARRAY_SIZE) {
            match value.parse::<usize>() {
                Ok(size) => self.initial_array_size = size,
                Err(_) => {
                    warn!(variable = env::INITIAL_ARRAY_SIZE, %value, "Ignoring unparsable override")
                }
            }
        }
        self
    }
}

fn default_max_array_size() -> usize {
    limits::MAX_ARRAY_SIZE
}

fn default_initial_array_size() -> usize {
    limits::INITIAL_ARRAY_SIZE
}

/// One attribute of the dictionary structure
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Textual null value, parsed according to `attribute_type`
    #[serde(default)]
    pub null_value: String,
    #[serde(default)]
    pub hierarchical: bool,
}

impl AttributeDescriptor {
    pub fn new(name: &str, attribute_type: AttributeType, null_value: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type,
            null_value: null_value.to_string(),
            hierarchical: false,
        }
    }

    /// Mark this attribute as the parent-id column
    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }
}

/// Ordered attribute list of a dictionary
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct DictionaryStructure {
    #[serde(default, rename = "attribute")]
    pub attributes: Vec<AttributeDescriptor>,
}

impl DictionaryStructure {
    pub fn new(attributes: Vec<AttributeDescriptor>) -> Self {
        Self { attributes }
    }

    /// Check name uniqueness and that at most one attribute is hierarchical
    pub fn validate(&self) -> DictionaryResult<()> {
        let mut seen = HashSet::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            if attribute.name.is_empty() {
                return Err(DictionaryError::invalid_structure("attribute name must not be empty"));
            }
            if !seen.insert(attribute.name.as_str()) {
                return Err(DictionaryError::invalid_structure(format!(
                    "duplicate attribute '{}'",
                    attribute.name
                )));
            }
        }

        let hierarchical: Vec<_> =
            self.attributes.iter().filter(|a| a.hierarchical).map(|a| a.name.as_str()).collect();
        if hierarchical.len() > 1 {
            return Err(DictionaryError::invalid_structure(format!(
                "at most one hierarchical attribute allowed, found {}",
                hierarchical.join(", ")
            )));
        }
        Ok(())
    }
}

/// Complete configuration of one flat dictionary
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DictionaryConfig {
    pub name: String,
    #[serde(default)]
    pub limits: DictionaryLimits,
    pub structure: DictionaryStructure,
}

impl DictionaryConfig {
    pub fn from_toml_str(config: &str) -> DictionaryResult<Self> {
        let config: Self = toml::from_str(config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> DictionaryResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading dictionary configuration");
        let config_str = fs::read_to_string(path)?;
        Self::from_toml_str(&config_str)
    }

    /// Apply environment overrides to the limits and re-validate
    pub fn apply_profile(mut self) -> DictionaryResult<Self> {
        self.limits = self.limits.apply_env_overrides();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> DictionaryResult<()> {
        self.limits.validate()?;
        self.structure.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEO_CONFIG: &str = r#"
name = "regions"

[limits]
max_array_size = 1000

[[structure.attribute]]
name = "parent_id"
type = "UInt32"
null_value = "0"
hierarchical = true

[[structure.attribute]]
name = "name"
type = "String"
null_value = "unknown"
"#;

    #[test]
    fn test_parse_toml_config() {
        let config = DictionaryConfig::from_toml_str(GEO_CONFIG).unwrap();
        assert_eq!(config.name, "regions");
        assert_eq!(config.limits.max_array_size, 1000);
        assert_eq!(config.limits.initial_array_size, limits::INITIAL_ARRAY_SIZE);
        assert_eq!(config.structure.attributes.len(), 2);
        assert!(config.structure.attributes[0].hierarchical);
        assert_eq!(config.structure.attributes[1].attribute_type, AttributeType::String);
        assert_eq!(config.structure.attributes[1].null_value, "unknown");
    }

    #[test]
    fn test_defaults_without_limits_section() {
        let config = DictionaryConfig::from_toml_str(
            "name = \"d\"\n[[structure.attribute]]\nname = \"v\"\ntype = \"Int8\"\n",
        )
        .unwrap();
        assert_eq!(config.limits, DictionaryLimits::default());
        assert_eq!(config.structure.attributes[0].null_value, "");
        assert!(!config.structure.attributes[0].hierarchical);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = DictionaryConfig::from_toml_str(
            "name = \"d\"\n[[structure.attribute]]\nname = \"v\"\ntype = \"Decimal\"\n",
        )
        .unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_duplicate_and_double_hierarchy_rejected() {
        let duplicate = DictionaryStructure::new(vec![
            AttributeDescriptor::new("a", AttributeType::UInt8, "0"),
            AttributeDescriptor::new("a", AttributeType::UInt16, "0"),
        ]);
        assert!(duplicate.validate().is_err());

        let two_parents = DictionaryStructure::new(vec![
            AttributeDescriptor::new("a", AttributeType::UInt8, "0").hierarchical(),
            AttributeDescriptor::new("b", AttributeType::UInt16, "0").hierarchical(),
        ]);
        let err = two_parents.validate().unwrap_err();
        assert!(err.to_string().contains("at most one hierarchical"));
    }

    #[test]
    fn test_limits_validation() {
        assert!(DictionaryLimits::new(10, 10).validate().is_ok());
        assert!(DictionaryLimits::new(10, 11).validate().is_err());
        assert!(DictionaryLimits::new(0, 0).validate().is_err());
        assert!(DictionaryLimits::new(10, 0).validate().is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_env_overrides() {
        // SAFETY: serialised with every other test touching these variables
        unsafe {
            std::env::set_var(env::MAX_ARRAY_SIZE, "2048");
            std::env::set_var(env::INITIAL_ARRAY_SIZE, "not-a-number");
        }

        let overridden = DictionaryLimits::default().apply_env_overrides();

        unsafe {
            std::env::remove_var(env::MAX_ARRAY_SIZE);
            std::env::remove_var(env::INITIAL_ARRAY_SIZE);
        }

        assert_eq!(overridden.max_array_size, 2048);
        assert_eq!(overridden.initial_array_size, limits::INITIAL_ARRAY_SIZE);
    }
}
