//! Integration tests for configuration loading and graceful degradation
//!
//! Covers:
//! - Missing TOML file → defaults, no error
//! - Malformed TOML file → Config error
//! - ENV overrides applied over file values
//!
//! Note: Uses serial_test to prevent ENV variable races. Tests that touch
//! VIROME_* variables are marked #[serial].

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;
use virome_common::config::{
    load_config, load_toml_config, TomlConfig, ENV_LASTFM_API_KEY, ENV_LOG_LEVEL,
};
use virome_common::Error;

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = load_toml_config(&path).expect("missing file must not be an error");
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("virome.toml");
    fs::write(&path, "[server\nport = ").unwrap();

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_file_values_loaded() {
    env::remove_var(ENV_LASTFM_API_KEY);
    env::remove_var(ENV_LOG_LEVEL);

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("virome.toml");
    fs::write(
        &path,
        r#"
        [server]
        port = 9001

        [upstream]
        lyrics_api_base = "http://127.0.0.1:4000/api"
        lastfm_api_key = "from-file"

        [mirrors]
        manifest_url = "http://127.0.0.1:4000/instances.json"
        cache_ttl_secs = 30
        "#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.server.port, 9001);
    assert_eq!(config.upstream.lyrics_api_base, "http://127.0.0.1:4000/api");
    assert_eq!(config.upstream.lastfm_api_key.as_deref(), Some("from-file"));
    assert_eq!(config.mirrors.cache_ttl_secs, 30);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("virome.toml");
    fs::write(
        &path,
        r#"
        [logging]
        level = "warn"

        [upstream]
        lastfm_api_key = "from-file"
        "#,
    )
    .unwrap();

    env::set_var(ENV_LASTFM_API_KEY, "from-env");
    env::set_var(ENV_LOG_LEVEL, "DEBUG");

    let config = load_config(Some(&path)).unwrap();

    env::remove_var(ENV_LASTFM_API_KEY);
    env::remove_var(ENV_LOG_LEVEL);

    assert_eq!(config.upstream.lastfm_api_key.as_deref(), Some("from-env"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_blank_env_value_ignored() {
    env::set_var(ENV_LASTFM_API_KEY, "   ");

    let mut config = TomlConfig::default();
    config.apply_env_overrides();

    env::remove_var(ENV_LASTFM_API_KEY);

    assert!(config.upstream.lastfm_api_key.is_none());
}

#[test]
#[serial]
fn test_invalid_values_fail_validation() {
    env::remove_var(ENV_LASTFM_API_KEY);
    env::remove_var(ENV_LOG_LEVEL);

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("virome.toml");
    fs::write(
        &path,
        r#"
        [mirrors]
        cache_ttl_secs = 0
        "#,
    )
    .unwrap();

    let result = load_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}
