//! Error kinds surfaced by the failover manager.

use thiserror::Error;

use super::identity::BackendIdentity;
use crate::coordinator::CoordinatorError;
use crate::provider::ProviderError;

/// The coordinator's configuration endpoint could not be reached or parsed.
///
/// Non-fatal: the manager keeps its default identity.
#[derive(Debug, Error)]
#[error("Failed to query coordinator configuration: {0}")]
pub struct ConfigQueryError(#[from] pub CoordinatorError);

/// A sign-in chain failed after exhausting failover retries.
#[derive(Debug, Error)]
#[error("Sign in failed against '{identity}' after {attempts} attempt(s): {source}")]
pub struct AuthError {
    /// Identity of the last attempt.
    pub identity: BackendIdentity,
    /// Provider calls made by this sign-in chain.
    pub attempts: u32,
    #[source]
    pub source: ProviderError,
}

/// The coordinator was not told about an identity switch.
#[derive(Debug, Error)]
#[error("Failed to notify coordinator of switch to '{identity}': {source}")]
pub struct SwitchNotificationError {
    pub identity: BackendIdentity,
    #[source]
    pub source: CoordinatorError,
}

/// The provider's sign-out call failed. Local session state is cleared anyway.
#[derive(Debug, Error)]
#[error("Sign out from '{identity}' failed: {source}")]
pub struct SignOutError {
    pub identity: BackendIdentity,
    #[source]
    pub source: ProviderError,
}

/// Side-channel failures of an identity switch.
///
/// Returned after the local identity has already changed.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("Switch completed locally, but {0}")]
    SignOut(#[source] SignOutError),

    #[error("Switch completed locally, but {0}")]
    Notification(#[source] SwitchNotificationError),

    #[error("Switch completed locally, but {sign_out}; {notification}")]
    Both {
        sign_out: SignOutError,
        #[source]
        notification: SwitchNotificationError,
    },
}

impl SwitchError {
    pub(crate) fn from_parts(
        sign_out: Option<SignOutError>,
        notification: Option<SwitchNotificationError>,
    ) -> Option<Self> {
        match (sign_out, notification) {
            (None, None) => None,
            (Some(s), None) => Some(SwitchError::SignOut(s)),
            (None, Some(n)) => Some(SwitchError::Notification(n)),
            (Some(sign_out), Some(notification)) => Some(SwitchError::Both {
                sign_out,
                notification,
            }),
        }
    }

    /// The notification failure, if the coordinator was not reached.
    pub fn notification(&self) -> Option<&SwitchNotificationError> {
        match self {
            SwitchError::Notification(n) | SwitchError::Both { notification: n, .. } => Some(n),
            SwitchError::SignOut(_) => None,
        }
    }

    /// The sign-out failure, if the old session could not be ended.
    pub fn sign_out(&self) -> Option<&SignOutError> {
        match self {
            SwitchError::SignOut(s) | SwitchError::Both { sign_out: s, .. } => Some(s),
            SwitchError::Notification(_) => None,
        }
    }
}
