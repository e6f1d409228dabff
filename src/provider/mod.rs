//! Identity-provider capability.
//!
//! The failover manager talks to two independently configured providers,
//! resolved by [`BackendIdentity`]. Any type implementing
//! [`IdentityProvider`] can fill either slot.

mod http;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::auth::{BackendIdentity, Credentials, Session};
use crate::config::Config;

pub use http::HttpIdentityProvider;
pub use memory::InMemoryProvider;

/// Errors reported by an identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused the credentials.
    #[error("Credentials rejected ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// The provider could not be reached.
    #[error("Connection to identity provider failed: {source}")]
    Connection {
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with something we could not interpret.
    #[error("Malformed provider response: {message}")]
    Malformed { message: String },

    /// The provider is up but not serving requests.
    #[error("Identity provider '{identity}' unavailable: {reason}")]
    Unavailable {
        identity: BackendIdentity,
        reason: String,
    },

    /// No provider entry exists for the identity.
    #[error("No identity provider configured for '{identity}'")]
    NotConfigured { identity: BackendIdentity },
}

/// Capability surface required from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Slot this provider serves, for logging.
    fn identity(&self) -> BackendIdentity;

    /// Verify credentials and start a session.
    ///
    /// On success the new session is also published to subscribers.
    async fn sign_in_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, ProviderError>;

    /// End the current session, if any.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Last known session.
    fn current_session(&self) -> Option<Session>;

    /// Stream of session transitions.
    ///
    /// The receiver starts out holding the current state, so the first
    /// read observes the session at registration time.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// The two named provider instances.
#[derive(Clone)]
pub struct ProviderSet {
    main: Arc<dyn IdentityProvider>,
    backup: Arc<dyn IdentityProvider>,
}

impl ProviderSet {
    pub fn new(main: Arc<dyn IdentityProvider>, backup: Arc<dyn IdentityProvider>) -> Self {
        Self { main, backup }
    }

    /// Build HTTP providers for both identities from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let build = |identity: BackendIdentity| -> Result<Arc<dyn IdentityProvider>, ProviderError> {
            let entry = config
                .provider(identity)
                .ok_or(ProviderError::NotConfigured { identity })?;
            Ok(Arc::new(HttpIdentityProvider::new(entry)?))
        };

        Ok(Self {
            main: build(BackendIdentity::Main)?,
            backup: build(BackendIdentity::Backup)?,
        })
    }

    pub fn get(&self, identity: BackendIdentity) -> &Arc<dyn IdentityProvider> {
        match identity {
            BackendIdentity::Main => &self.main,
            BackendIdentity::Backup => &self.backup,
        }
    }
}
