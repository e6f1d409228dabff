use std::time::Duration;

use super::identity::BackendIdentity;
use crate::config::SecureString;

/// Email/password pair handed to a provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecureString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Authenticated user context maintained by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub id_token: SecureString,
    pub refresh_token: Option<SecureString>,
    /// Provider instance that issued the session.
    pub identity: BackendIdentity,
    pub expires_in: Option<Duration>,
}
