//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use micromap::config::AppConfig;
use micromap_core::OmmFormat;
use serial_test::serial;
use std::fs;

// ==================== File Tests ====================

/// Test that the shipped default.toml matches the built-in defaults
#[test]
#[serial]
fn test_default_toml_matches_defaults() {
    std::env::remove_var("OMM_BVH__EXCLUDE_TRANSMISSIVE");
    std::env::remove_var("OMM_OMM__BAKE__FORMAT");

    let loaded = AppConfig::load_from(concat!(env!("CARGO_MANIFEST_DIR"), "/config")).unwrap();
    let defaults = AppConfig::default();

    assert_eq!(loaded.bvh.exclude_transmissive, defaults.bvh.exclude_transmissive);
    assert_eq!(loaded.omm.bake, defaults.omm.bake);
    assert_eq!(loaded.omm.enable, defaults.omm.enable);
    assert_eq!(loaded.debug.grid_resolution, defaults.debug.grid_resolution);
    assert_eq!(loaded.input.manifest, defaults.input.manifest);
}

/// Test that user.toml overrides default.toml
#[test]
#[serial]
fn test_user_config_overrides_default() {
    std::env::remove_var("OMM_BVH__EXCLUDE_TRANSMISSIVE");

    let dir = std::env::temp_dir().join("micromap_config_tests").join("user_override");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("default.toml"), "[omm]\nonly_omms = false\n\n[debug]\ngrid_resolution = 8\n").unwrap();
    fs::write(dir.join("user.toml"), "[omm]\nonly_omms = true\n").unwrap();

    let config = AppConfig::load_from(&dir).unwrap();
    assert!(config.omm.only_omms);
    assert_eq!(config.debug.grid_resolution, 8);
}

/// Test that a missing config directory falls back to defaults
#[test]
#[serial]
fn test_missing_directory_uses_defaults() {
    std::env::remove_var("OMM_BVH__EXCLUDE_TRANSMISSIVE");

    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert!(!config.bvh.exclude_transmissive);
    assert_eq!(config.omm.bake.max_subdivision_level, 12);
}

// ==================== Environment Tests ====================

/// Test that OMM_ environment variables override file values
#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("OMM_BVH__EXCLUDE_TRANSMISSIVE", "true");
    std::env::set_var("OMM_OMM__BAKE__FORMAT", "Oc1TwoState");

    let config = AppConfig::load_from(concat!(env!("CARGO_MANIFEST_DIR"), "/config")).unwrap();

    std::env::remove_var("OMM_BVH__EXCLUDE_TRANSMISSIVE");
    std::env::remove_var("OMM_OMM__BAKE__FORMAT");

    assert!(config.bvh.exclude_transmissive);
    assert_eq!(config.omm.bake.format, OmmFormat::Oc1TwoState);
}

/// Test that an invalid value is reported as an error
#[test]
#[serial]
fn test_invalid_value_is_an_error() {
    std::env::set_var("OMM_DEBUG__GRID_RESOLUTION", "many");
    let result = AppConfig::load_from("does/not/exist");
    std::env::remove_var("OMM_DEBUG__GRID_RESOLUTION");

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}
