use serde::{Deserialize, Serialize};

use crate::auth::BackendIdentity;

/// Root configuration container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub failover: FailoverConfig,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

/// Where the sync coordinator lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Base URL of the coordinator (scheme + host + port).
    #[serde(default = "default_coordinator_url")]
    pub base_url: String,
    /// Total request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

/// Failover behaviour of the auth manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// Max failover retries per sign-in chain (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Identity used until the coordinator says otherwise.
    #[serde(default)]
    pub default_identity: BackendIdentity,
}

/// One identity-provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which slot this provider fills ("main" or "backup").
    pub identity: BackendIdentity,
    /// Base URL of the provider's REST API.
    pub base_url: String,
    /// API key sent with every request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Total request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

fn default_coordinator_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_provider_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(BackendIdentity::Main, default_provider_url()),
        ProviderConfig::new(BackendIdentity::Backup, default_provider_url()),
    ]
}

impl ProviderConfig {
    pub fn new(identity: BackendIdentity, base_url: impl Into<String>) -> Self {
        Self {
            identity,
            base_url: base_url.into(),
            api_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl Config {
    /// Look up the provider entry for an identity.
    pub fn provider(&self, identity: BackendIdentity) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.identity == identity)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_coordinator_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            default_identity: BackendIdentity::Main,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            failover: FailoverConfig::default(),
            providers: default_providers(),
        }
    }
}
