//! In-process identity provider backed by an account table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::{IdentityProvider, ProviderError};
use crate::auth::{BackendIdentity, Credentials, Session};
use crate::config::SecureString;

/// Provider that verifies credentials against a local account table.
///
/// Can be told to reject every sign-in or fail every sign-out, and counts
/// the calls it receives.
pub struct InMemoryProvider {
    identity: BackendIdentity,
    accounts: Mutex<HashMap<String, SecureString>>,
    reject_all: AtomicBool,
    fail_sign_out: AtomicBool,
    sign_in_calls: AtomicU32,
    sign_out_calls: AtomicU32,
    sessions: watch::Sender<Option<Session>>,
}

impl InMemoryProvider {
    pub fn new(identity: BackendIdentity) -> Self {
        let (sessions, _) = watch::channel(None);
        Self {
            identity,
            accounts: Mutex::new(HashMap::new()),
            reject_all: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            sign_in_calls: AtomicU32::new(0),
            sign_out_calls: AtomicU32::new(0),
            sessions,
        }
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.add_account(email, password);
        self
    }

    pub fn add_account(&self, email: &str, password: &str) {
        self.accounts
            .lock()
            .insert(email.to_lowercase(), SecureString::new(password));
    }

    /// Refuse every sign-in regardless of the account table.
    pub fn set_reject_all(&self, reject: bool) {
        self.reject_all.store(reject, Ordering::SeqCst);
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn sign_in_calls(&self) -> u32 {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> u32 {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn verify(&self, credentials: &Credentials) -> bool {
        if self.reject_all.load(Ordering::SeqCst) {
            return false;
        }
        self.accounts
            .lock()
            .get(&credentials.email.to_lowercase())
            .is_some_and(|stored| stored == &credentials.password)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryProvider {
    fn identity(&self) -> BackendIdentity {
        self.identity
    }

    async fn sign_in_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, ProviderError> {
        let call = self.sign_in_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.verify(credentials) {
            return Err(ProviderError::Rejected {
                code: 400,
                message: "INVALID_LOGIN_CREDENTIALS".to_string(),
            });
        }

        let session = Session {
            user_id: format!("{}:{}", self.identity, credentials.email.to_lowercase()),
            email: credentials.email.clone(),
            id_token: SecureString::new(format!("{}-token-{}", self.identity, call)),
            refresh_token: None,
            identity: self.identity,
            expires_in: None,
        };
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable {
                identity: self.identity,
                reason: "sign-out refused".to_string(),
            });
        }

        self.sessions.send_replace(None);
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.sessions.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sessions.subscribe()
    }
}
