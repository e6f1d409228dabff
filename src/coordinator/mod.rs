//! Client side of the sync coordinator's HTTP contract.

mod command;
mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::BackendIdentity;

pub use command::{CommandOutcome, SyncCommand};
pub use http::HttpCoordinator;

pub const CONFIG_PATH: &str = "/api/firebase-config";
pub const CONFIG_SWITCH_PATH: &str = "/api/config-switch";

/// Errors talking to the coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to '{endpoint}' failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{endpoint}' returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Could not decode response from '{endpoint}': {message}")]
    Decode { endpoint: String, message: String },

    #[error("'{endpoint}' returned '{content_type}' instead of JSON")]
    UnexpectedContentType {
        endpoint: String,
        content_type: String,
    },

    #[error("Coordinator reported unknown identity '{0}'")]
    UnknownIdentity(String),
}

/// Operations the failover manager needs from the coordinator.
#[async_trait]
pub trait SyncCoordinator: Send + Sync {
    /// Identity the coordinator currently recommends.
    async fn current_config(&self) -> Result<BackendIdentity, CoordinatorError>;

    /// Tell the coordinator which identity is now active.
    async fn announce_switch(&self, identity: BackendIdentity) -> Result<(), CoordinatorError>;
}
