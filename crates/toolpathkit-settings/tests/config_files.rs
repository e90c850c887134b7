//! Settings file round trips through JSON and TOML.

use std::path::PathBuf;
use tempfile::TempDir;
use toolpathkit_settings::{Config, SettingsError};

fn custom_config(dir: &TempDir) -> Config {
    let mut config = Config::new();
    config.paths.data_dir = dir.path().join("results");
    config.logging.level = "debug".to_string();
    config.logging.json = true;
    config.generation.event_history = true;
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("config.toml");
    let config = custom_config(&dir);

    config.save_to_file(&path).expect("save");
    let loaded = Config::load_from_file(&path).expect("load");

    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    let config = custom_config(&dir);

    config.save_to_file(&path).expect("save");
    let loaded = Config::load_from_file(&path).expect("load");

    assert_eq!(loaded.paths.data_dir, dir.path().join("results"));
    assert!(loaded.logging.json);
}

#[test]
fn test_missing_sections_use_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").expect("write");

    let loaded = Config::load_from_file(&path).expect("load");
    assert_eq!(loaded.logging.level, "warn");
    assert!(!loaded.logging.json);
    assert_eq!(loaded.generation, Config::new().generation);
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"loud\"\n").expect("write");

    let result = Config::load_from_file(&path);
    assert!(matches!(result, Err(SettingsError::Config(_))));
}

#[test]
fn test_load_or_default_when_absent() {
    let dir = TempDir::new().expect("temp dir");
    let path: PathBuf = dir.path().join("absent.toml");

    let loaded = Config::load_or_default(&path).expect("defaults");
    assert_eq!(loaded, Config::new());
}
