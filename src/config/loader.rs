use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auth::BackendIdentity;
use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/auth-failover/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("auth-failover").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise behaves like [`Config::load_from`].
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&path)
    }

    /// Loads, parses and validates configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - `max_retries` is at least 1
    /// - the coordinator URL is set
    /// - each identity has exactly one provider with a base URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failover.max_retries == 0 {
            return Err(ConfigError::ValidationError {
                message: "failover.max_retries must be at least 1".to_string(),
            });
        }

        if self.coordinator.base_url.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "coordinator.base_url must not be empty".to_string(),
            });
        }

        for identity in [BackendIdentity::Main, BackendIdentity::Backup] {
            let entries: Vec<_> = self
                .providers
                .iter()
                .filter(|p| p.identity == identity)
                .collect();

            match entries.as_slice() {
                [] => {
                    return Err(ConfigError::ValidationError {
                        message: format!("No provider configured for '{}'", identity),
                    })
                }
                [single] if single.base_url.is_empty() => {
                    return Err(ConfigError::ValidationError {
                        message: format!("Provider '{}' has an empty base_url", identity),
                    })
                }
                [_] => {}
                _ => {
                    return Err(ConfigError::ValidationError {
                        message: format!("Provider '{}' is configured more than once", identity),
                    })
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = Config::default();
        config.failover.max_retries = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_missing_backup_rejected() {
        let mut config = Config::default();
        config
            .providers
            .retain(|p| p.identity != BackendIdentity::Backup);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backup"));
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let mut config = Config::default();
        config
            .providers
            .push(ProviderConfig::new(BackendIdentity::Main, "http://other"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_config_path_ends_with_expected() {
        assert!(Config::config_path().ends_with("auth-failover/config.toml"));
    }
}
