mod common;

use auth_failover::auth::{BackendIdentity, FailoverSettings};
use auth_failover::config::{Config, ConfigError};

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.failover.max_retries, 3);
    assert_eq!(config.failover.default_identity, BackendIdentity::Main);
    assert_eq!(config.coordinator.timeout_seconds, 10);
    assert_eq!(config.coordinator.connect_timeout_seconds, 5);
    assert!(config.provider(BackendIdentity::Main).is_some());
    assert!(config.provider(BackendIdentity::Backup).is_some());
}

#[test]
fn test_load_full_file() {
    let (_dir, path) = common::temp_config(
        r#"
[coordinator]
base_url = "https://sync.example.com"
timeout_seconds = 20

[failover]
max_retries = 5
default_identity = "backup"

[[providers]]
identity = "main"
base_url = "https://main.example.com"
api_key = "main-key"

[[providers]]
identity = "backup"
base_url = "https://backup.example.com"
timeout_seconds = 4
"#,
    );

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.coordinator.base_url, "https://sync.example.com");
    assert_eq!(config.coordinator.timeout_seconds, 20);
    assert_eq!(config.coordinator.connect_timeout_seconds, 5);
    assert_eq!(
        config.provider(BackendIdentity::Main).unwrap().api_key.as_deref(),
        Some("main-key")
    );
    assert!(config.provider(BackendIdentity::Backup).unwrap().api_key.is_none());
    assert_eq!(config.provider(BackendIdentity::Main).unwrap().timeout_seconds, 10);
    assert_eq!(config.provider(BackendIdentity::Backup).unwrap().timeout_seconds, 4);

    let settings = FailoverSettings::from(&config.failover);
    assert_eq!(settings.max_retries, 5);
    assert_eq!(settings.initial_identity, BackendIdentity::Backup);
}

#[test]
fn test_sections_are_optional() {
    let (_dir, path) = common::temp_config("[failover]\nmax_retries = 2\n");

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.failover.max_retries, 2);
    assert_eq!(config.providers.len(), 2);
}

#[test]
fn test_unknown_identity_is_parse_error() {
    let (_dir, path) = common::temp_config(
        r#"
[[providers]]
identity = "tertiary"
base_url = "https://x.example.com"
"#,
    );

    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ReadError { .. })
    ));
}

#[test]
fn test_single_provider_fails_validation() {
    let (_dir, path) = common::temp_config(
        r#"
[[providers]]
identity = "main"
base_url = "https://main.example.com"
"#,
    );

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
    assert!(err.to_string().contains("backup"));
}
