use std::fs;

use tempfile::TempDir;
use vantasys::core::config::{Config, DEFAULT_CONNECTION_LIMIT, DEFAULT_PROCESS_LIMIT};

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.default_process_limit, DEFAULT_PROCESS_LIMIT);
    assert_eq!(config.default_connection_limit, DEFAULT_CONNECTION_LIMIT);
    assert!(config.hardware_scan);
    assert_eq!(config.log_level, "info");
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        default_process_limit: 5,
        hardware_scan: false,
        log_level: "debug".to_string(),
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.log_level_filter(), log::LevelFilter::Debug);
    assert!(!loaded.collector_config().scan_hardware);
}

#[test]
fn test_missing_and_corrupt_files_give_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("absent.json");
    assert_eq!(Config::load_from(&missing).unwrap(), Config::default());

    let corrupt = temp_dir.path().join("corrupt.json");
    fs::write(&corrupt, "{ not json").unwrap();
    assert_eq!(Config::load_from(&corrupt).unwrap(), Config::default());
}

#[test]
fn test_unknown_log_level_falls_back_to_info() {
    let config = Config {
        log_level: "chatty".to_string(),
        ..Default::default()
    };
    assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
}
