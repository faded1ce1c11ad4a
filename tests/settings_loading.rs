//! Integration tests for loading connection settings from files and environment.

#![allow(unsafe_code)] // For env var manipulation in tests

use cloud_config_client::prelude::*;
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_yaml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.yaml");

    fs::write(
        &path,
        r#"
base_url: https://config.example.com/
application_name: orders
profiles: prod, eu
label: release-2
username: reader
password: s3cret
timeout_secs: 3
encryption:
  algorithm: aes
  mode: ecb
  key: 0123456789abcdef
"#,
    )
    .unwrap();

    let settings = ConnectionSettings::load(Some(&path), "TEST_SETTINGS_YAML").unwrap();
    assert_eq!(settings.base_url(), "https://config.example.com/");
    assert_eq!(settings.application_name(), Some("orders"));
    assert_eq!(settings.profiles(), ["prod", "eu"]);
    assert_eq!(settings.label(), "release-2");
    assert_eq!(settings.credentials(), Some(("reader", "s3cret")));
    assert_eq!(settings.timeout(), Duration::from_secs(3));

    let encryption = settings.encryption().unwrap();
    assert_eq!(encryption.algorithm, Algorithm::Aes);
    assert_eq!(encryption.mode, Mode::Ecb);
    assert!(!encryption.random_iv);
}

#[test]
fn test_load_toml_file_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.toml");

    fs::write(&path, "application_name = \"billing\"\n").unwrap();

    let settings = ConnectionSettings::load(Some(&path), "TEST_SETTINGS_TOML").unwrap();
    assert_eq!(settings.application_name(), Some("billing"));
    assert_eq!(settings.base_url(), "http://localhost:8888/");
    assert_eq!(settings.label(), "master");
    assert!(settings.profiles().is_empty());
    assert!(settings.encryption().is_none());
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    fs::write(
        &path,
        r#"{"application_name": "orders", "label": "master", "encryption": {"key": ""}}"#,
    )
    .unwrap();

    unsafe {
        env::set_var("TEST_SETTINGS_ENV_LABEL", "hotfix");
        env::set_var("TEST_SETTINGS_ENV_PROFILES", "staging");
        env::set_var("TEST_SETTINGS_ENV_ENCRYPTION__KEY", "0123456789abcdef");
    }

    let settings = ConnectionSettings::load(Some(&path), "TEST_SETTINGS_ENV").unwrap();

    unsafe {
        env::remove_var("TEST_SETTINGS_ENV_LABEL");
        env::remove_var("TEST_SETTINGS_ENV_PROFILES");
        env::remove_var("TEST_SETTINGS_ENV_ENCRYPTION__KEY");
    }

    assert_eq!(settings.application_name(), Some("orders"));
    assert_eq!(settings.label(), "hotfix");
    assert_eq!(settings.profiles(), ["staging"]);
    let encryption = settings.encryption().unwrap();
    assert_eq!(encryption.mode, Mode::Cbc);
}

#[test]
fn test_env_only() {
    unsafe {
        env::set_var("TEST_SETTINGS_ONLY_BASE_URL", "http://config:8888/");
        env::set_var("TEST_SETTINGS_ONLY_TIMEOUT_SECS", "7");
    }

    let settings = ConnectionSettings::load(None, "TEST_SETTINGS_ONLY").unwrap();

    unsafe {
        env::remove_var("TEST_SETTINGS_ONLY_BASE_URL");
        env::remove_var("TEST_SETTINGS_ONLY_TIMEOUT_SECS");
    }

    assert_eq!(settings.base_url(), "http://config:8888/");
    assert_eq!(settings.timeout(), Duration::from_secs(7));
}

#[test]
fn test_missing_file() {
    let err = ConnectionSettings::load(
        Some(std::path::Path::new("/nonexistent/settings.yaml")),
        "TEST_SETTINGS_MISSING",
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Settings(_)));
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.ini");
    fs::write(&path, "label=master").unwrap();

    let err = ConnectionSettings::load(Some(&path), "TEST_SETTINGS_INI").unwrap_err();
    assert!(matches!(err, ConfigError::Settings(_)));
}

#[test]
fn test_unknown_mode() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.yaml");
    fs::write(&path, "encryption:\n  key: k\n  mode: GCM\n").unwrap();

    let err = ConnectionSettings::load(Some(&path), "TEST_SETTINGS_MODE").unwrap_err();
    assert!(err.is_configuration());
}
