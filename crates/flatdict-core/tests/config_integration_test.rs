//! End-to-end construction of dictionaries from TOML configuration

use flatdict_core::{AttributeType, DictionaryConfig, Field, FlatDictionary, MemorySource};
use serial_test::serial;
use std::io::Write;

const REGIONS_TOML: &str = r#"
name = "regions"

[limits]
max_array_size = 10000
initial_array_size = 32

[[structure.attribute]]
name = "parent_id"
type = "UInt32"
null_value = "0"
hierarchical = true

[[structure.attribute]]
name = "name"
type = "String"
null_value = "n/a"

[[structure.attribute]]
name = "population"
type = "Int64"
"#;

fn region_rows() -> MemorySource {
    MemorySource::from_rows(
        3,
        128,
        vec![
            (1, vec![Field::from(0u32), Field::from("World"), Field::from(8_000_000_000i64)]),
            (2, vec![Field::from(1u32), Field::from("Europe"), Field::from(750_000_000i64)]),
        ],
    )
}

#[test]
fn test_dictionary_from_toml() {
    let config = DictionaryConfig::from_toml_str(REGIONS_TOML).unwrap();
    let dict = FlatDictionary::from_config(&config, &mut region_rows()).unwrap();

    assert_eq!(dict.name(), "regions");
    assert_eq!(dict.limits().max_array_size, 10_000);
    assert_eq!(dict.attribute_type(2), Some(AttributeType::Int64));
    assert_eq!(dict.structure(), &config.structure);

    assert_eq!(dict.get::<str>("name", 2).unwrap(), "Europe");
    assert_eq!(dict.get::<str>("name", 3).unwrap(), "n/a");
    assert_eq!(dict.get::<i64>("population", 3).unwrap(), 0);
    assert_eq!(dict.to_parent(2).unwrap(), 1);
}

#[test]
fn test_lowercase_type_names() {
    let toml = r#"
name = "codes"

[[structure.attribute]]
name = "parent_id"
type = "uint32"
hierarchical = true

[[structure.attribute]]
name = "label"
type = "string"
null_value = "?"
"#;
    let config = DictionaryConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.structure.attributes[0].attribute_type, AttributeType::UInt32);

    let mut source = MemorySource::from_rows(2, 8, vec![(4, vec![Field::from(2u32), Field::from("four")])]);
    let dict = FlatDictionary::from_config(&config, &mut source).unwrap();
    assert_eq!(dict.get::<u32>("parent_id", 4).unwrap(), 2);
    assert_eq!(dict.get::<str>("label", 5).unwrap(), "?");
}

#[test]
fn test_unknown_type_name_rejected() {
    let toml = r#"
name = "broken"

[[structure.attribute]]
name = "price"
type = "decimal"
"#;
    let err = DictionaryConfig::from_toml_str(toml).unwrap_err();
    assert_eq!(err.category(), "configuration");
    assert!(err.to_string().contains("Unknown attribute type 'decimal'"));
}

#[test]
fn test_dictionary_from_file() {
    let path = std::env::temp_dir().join(format!("flatdict-config-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(REGIONS_TOML.as_bytes()).unwrap();
    }

    let config = DictionaryConfig::from_file(&path);
    std::fs::remove_file(&path).unwrap();

    let dict = FlatDictionary::from_config(&config.unwrap(), &mut region_rows()).unwrap();
    assert_eq!(dict.get::<u32>("parent_id", 1).unwrap(), 0);
}

#[test]
fn test_missing_file_is_a_source_error() {
    let err = DictionaryConfig::from_file("/nonexistent/flatdict.toml").unwrap_err();
    assert_eq!(err.category(), "source");
}

#[test]
fn test_config_limits_bound_loading() {
    let config = DictionaryConfig::from_toml_str(REGIONS_TOML).unwrap();
    let mut source = MemorySource::from_rows(
        3,
        128,
        vec![(10_000, vec![Field::from(0u32), Field::from("too far"), Field::from(1i64)])],
    );

    let err = FlatDictionary::from_config(&config, &mut source).unwrap_err();
    assert_eq!(err.category(), "id_out_of_bound");
}

#[test]
fn test_invalid_null_value_rejected_at_construction() {
    let toml = r#"
name = "broken"

[[structure.attribute]]
name = "code"
type = "UInt8"
null_value = "not a number"
"#;
    let config = DictionaryConfig::from_toml_str(toml).unwrap();
    let err = FlatDictionary::from_config(&config, &mut MemorySource::default()).unwrap_err();
    assert_eq!(err.category(), "value_parse");
}

#[test]
#[serial]
fn test_profile_overrides_limits() {
    // SAFETY: serialised with the other environment tests
    unsafe {
        std::env::set_var("FLATDICT_MAX_ARRAY_SIZE", "64");
        std::env::set_var("FLATDICT_INITIAL_ARRAY_SIZE", "8");
    }
    let config = DictionaryConfig::from_toml_str(REGIONS_TOML).unwrap().apply_profile();
    unsafe {
        std::env::remove_var("FLATDICT_MAX_ARRAY_SIZE");
        std::env::remove_var("FLATDICT_INITIAL_ARRAY_SIZE");
    }

    let dict = FlatDictionary::from_config(&config.unwrap(), &mut region_rows()).unwrap();
    assert_eq!(dict.limits().max_array_size, 64);
    assert_eq!(dict.limits().initial_array_size, 8);
    assert_eq!(dict.get::<str>("name", 100).unwrap(), "n/a");
}
