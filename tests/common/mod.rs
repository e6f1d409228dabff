//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use auth_failover::auth::BackendIdentity;
use auth_failover::config::{CoordinatorConfig, ProviderConfig};
use std::path::PathBuf;
use tempfile::TempDir;

pub const SIGN_IN_PATH: &str = "/v1/accounts:signInWithPassword";

/// Coordinator config pointing at a mock server with short timeouts.
pub fn coordinator_config(base_url: &str) -> CoordinatorConfig {
    CoordinatorConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 2,
        connect_timeout_seconds: 1,
    }
}

pub fn provider_config(identity: BackendIdentity, base_url: &str) -> ProviderConfig {
    ProviderConfig {
        identity,
        base_url: base_url.to_string(),
        api_key: Some(format!("{}-key", identity)),
        timeout_seconds: 2,
    }
}

/// Successful sign-in body as the provider returns it.
pub fn sign_in_body(user_id: &str, email: &str) -> String {
    format!(
        r#"{{"localId":"{}","email":"{}","idToken":"id-{}","refreshToken":"ref-{}","expiresIn":"3600"}}"#,
        user_id, email, user_id, user_id
    )
}

/// Write `content` to a config file in a fresh temp dir.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
