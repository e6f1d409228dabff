//! Failover state machine over the two identity providers.
//!
//! Identity only ever moves `Main -> Backup` on its own. Going back to
//! `Main` requires an explicit [`AuthFailoverManager::restore_main`].

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::watch;

use super::error::{AuthError, ConfigQueryError, SignOutError, SwitchError, SwitchNotificationError};
use super::identity::BackendIdentity;
use super::session::{Credentials, Session};
use super::state::{FailoverState, Listener, SessionCallback, SwitchLogEntry};
use crate::config::FailoverConfig;
use crate::coordinator::SyncCoordinator;
use crate::provider::ProviderSet;

/// Tunables for [`AuthFailoverManager`].
#[derive(Debug, Clone, Copy)]
pub struct FailoverSettings {
    /// Failover retries allowed before a sign-in chain gives up.
    pub max_retries: u32,
    /// Identity used until `initialize` learns otherwise.
    pub initial_identity: BackendIdentity,
}

impl Default for FailoverSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_identity: BackendIdentity::Main,
        }
    }
}

impl From<&FailoverConfig> for FailoverSettings {
    fn from(config: &FailoverConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_identity: config.default_identity,
        }
    }
}

/// Cheaply cloneable handle to the failover manager.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct AuthFailoverManager {
    inner: Arc<Inner>,
}

struct Inner {
    providers: ProviderSet,
    coordinator: Arc<dyn SyncCoordinator>,
    max_retries: u32,
    state: Mutex<FailoverState>,
    /// Held while callbacks run so they observe sessions in order.
    dispatch: ReentrantMutex<()>,
    /// Serializes sign-in chains so concurrent callers cannot double-switch.
    sign_in_gate: tokio::sync::Mutex<()>,
}

impl AuthFailoverManager {
    pub fn new(
        providers: ProviderSet,
        coordinator: Arc<dyn SyncCoordinator>,
        settings: FailoverSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                providers,
                coordinator,
                max_retries: settings.max_retries,
                state: Mutex::new(FailoverState::new(settings.initial_identity)),
                dispatch: ReentrantMutex::new(()),
                sign_in_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Ask the coordinator which identity to use and start listening to it.
    ///
    /// On error nothing changes and the manager keeps working with its
    /// initial identity.
    pub async fn initialize(&self) -> Result<BackendIdentity, ConfigQueryError> {
        let identity = match self.inner.coordinator.current_config().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize auth manager");
                return Err(ConfigQueryError(e));
            }
        };

        {
            let mut state = self.inner.state.lock();
            if state.active_identity != identity {
                state.set_identity(identity);
            }
        }
        self.inner.ensure_listener(identity);

        tracing::info!(identity = %identity, "Using {} identity provider configuration", identity);
        Ok(identity)
    }

    /// Register a callback for session changes.
    ///
    /// If a session is already known the callback runs immediately with it.
    /// Callbacks run in registration order.
    pub fn on_session_changed<F>(&self, callback: F)
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let callback: SessionCallback = Arc::new(callback);
        let _dispatch = self.inner.dispatch.lock();
        let current = {
            let mut state = self.inner.state.lock();
            state.subscribers.push(callback.clone());
            state.current_session.clone()
        };

        if let Some(session) = current {
            callback(Some(&session));
        }
    }

    /// Sign in against the active provider, failing over to backup on error.
    ///
    /// The returned session is what the provider answered; `current_user`
    /// changes only once the provider's session stream confirms it.
    ///
    /// Each failure switches to backup and retries until `retry_count`
    /// reaches `max_retries`, then surfaces the last provider error.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let _in_flight = self.inner.sign_in_gate.lock().await;
        let max_retries = self.inner.max_retries;
        let mut attempts = 0;

        // Every failed pass either returns or raises retry_count, which is
        // capped at max_retries, so at most max_retries + 1 attempts run.
        loop {
            let identity = self.current_config();
            self.inner.ensure_listener(identity);
            attempts += 1;

            tracing::info!(identity = %identity, attempt = attempts, "Attempting sign in");
            let provider = self.inner.providers.get(identity).clone();

            let source = match provider.sign_in_with_credentials(credentials).await {
                Ok(session) => {
                    // A chain that had to fail over keeps its failover count
                    // until a later sign-in succeeds first time.
                    if attempts == 1 {
                        self.inner.state.lock().retry_count = 0;
                    }
                    tracing::info!(identity = %identity, user_id = %session.user_id, "Sign in successful");
                    return Ok(session);
                }
                Err(e) => e,
            };
            tracing::warn!(identity = %identity, error = %source, "Sign in failed");

            let retry_count = {
                let mut state = self.inner.state.lock();
                if state.retry_count >= max_retries {
                    None
                } else {
                    state.retry_count += 1;
                    Some(state.retry_count)
                }
            };

            let Some(retry_count) = retry_count else {
                tracing::error!(
                    identity = %identity,
                    attempts,
                    max_retries,
                    "Sign in failed, retries exhausted"
                );
                return Err(AuthError {
                    identity,
                    attempts,
                    source,
                });
            };

            tracing::info!(retry_count, max_retries, "Attempting failover to backup");
            if let Err(e) = self.switch_to(BackendIdentity::Backup).await {
                tracing::warn!(error = %e, "Failover switch incomplete, retrying anyway");
            }
        }
    }

    /// Make `Backup` the active identity and tell the coordinator.
    ///
    /// Safe to repeat; every call re-sends the notification. The local
    /// identity is `Backup` afterwards even when an error is returned.
    pub async fn switch_to_backup(&self) -> Result<(), SwitchError> {
        self.switch_to(BackendIdentity::Backup).await
    }

    /// Explicitly return to `Main`, resetting the retry count.
    ///
    /// Never called automatically.
    pub async fn restore_main(&self) -> Result<(), SwitchError> {
        let _in_flight = self.inner.sign_in_gate.lock().await;
        let result = self.switch_to(BackendIdentity::Main).await;
        self.inner.state.lock().retry_count = 0;
        result
    }

    /// Sign out of the active provider. The local session is cleared even
    /// if the provider call fails.
    pub async fn sign_out(&self) -> Result<(), SignOutError> {
        let identity = self.current_config();
        let provider = self.inner.providers.get(identity).clone();
        let remote = provider.current_session();

        let result = match remote {
            Some(_) => provider
                .sign_out()
                .await
                .map_err(|source| SignOutError { identity, source }),
            None => Ok(()),
        };

        match &result {
            Ok(()) => {
                self.inner.clear_session(None);
                tracing::info!(identity = %identity, "Signed out");
            }
            Err(e) => {
                self.inner.clear_session(remote);
                tracing::error!(error = %e, "Sign out failed, local session cleared");
            }
        }

        result
    }

    /// Session last confirmed by the active provider.
    pub fn current_user(&self) -> Option<Session> {
        self.inner.state.lock().current_session.clone()
    }

    /// Active identity.
    pub fn current_config(&self) -> BackendIdentity {
        self.inner.state.lock().active_identity
    }

    pub fn retry_count(&self) -> u32 {
        self.inner.state.lock().retry_count
    }

    pub fn max_retries(&self) -> u32 {
        self.inner.max_retries
    }

    /// History of identity switches.
    pub fn switch_log(&self) -> Vec<SwitchLogEntry> {
        self.inner.state.lock().switch_log.clone()
    }

    async fn switch_to(&self, target: BackendIdentity) -> Result<(), SwitchError> {
        let from = self.current_config();
        tracing::info!(from = %from, to = %target, "Switching identity provider configuration");

        let provider = self.inner.providers.get(from).clone();
        let sign_out = match provider.current_session() {
            Some(_) => provider
                .sign_out()
                .await
                .err()
                .map(|source| SignOutError {
                    identity: from,
                    source,
                }),
            None => None,
        };
        if let Some(e) = &sign_out {
            tracing::warn!(error = %e, "Sign out before switch failed");
        }

        self.inner.state.lock().set_identity(target);
        self.inner.ensure_listener(target);

        let notification = self
            .inner
            .coordinator
            .announce_switch(target)
            .await
            .err()
            .map(|source| SwitchNotificationError {
                identity: target,
                source,
            });

        match SwitchError::from_parts(sign_out, notification) {
            None => {
                tracing::info!(identity = %target, "Switched identity provider configuration");
                Ok(())
            }
            Some(e) => {
                tracing::error!(identity = %target, error = %e, "Identity switch not fully acknowledged");
                Err(e)
            }
        }
    }
}

impl Inner {
    fn ensure_listener(self: &Arc<Self>, identity: BackendIdentity) {
        if self.state.lock().listener_identity() != Some(identity) {
            self.bind_listener(identity);
        }
    }

    /// Follow `identity`'s session stream, starting with its current state.
    fn bind_listener(self: &Arc<Self>, identity: BackendIdentity) {
        let mut sessions = self.providers.get(identity).subscribe();
        let initial = sessions.borrow_and_update().clone();

        self.state.lock().replace_listener(Listener {
            identity,
            task: None,
        });
        self.publish(identity, initial);

        // Changes made after the initial read stay flagged on the receiver.
        let task = tokio::spawn(forward_sessions(Arc::downgrade(self), identity, sessions));

        let mut state = self.state.lock();
        match state.listener.as_mut() {
            Some(listener) if listener.identity == identity && listener.task.is_none() => {
                listener.task = Some(task);
            }
            _ => task.abort(),
        }
    }

    /// Record a session reported by `source` and fan it out to subscribers.
    ///
    /// Reports that match the current session are dropped.
    fn publish(&self, source: BackendIdentity, session: Option<Session>) {
        let _dispatch = self.dispatch.lock();
        let subscribers = {
            let mut state = self.state.lock();
            if state.listener_identity() != Some(source) {
                return;
            }
            if session.is_some() && session == state.dismissed_session {
                return;
            }
            if session == state.current_session {
                return;
            }
            state.dismissed_session = None;
            state.current_session = session.clone();
            state.subscribers.clone()
        };

        for callback in &subscribers {
            callback(session.as_ref());
        }
    }

    /// Drop the local session; `dismissed` is ignored if the provider replays it.
    fn clear_session(&self, dismissed: Option<Session>) {
        let _dispatch = self.dispatch.lock();
        let subscribers = {
            let mut state = self.state.lock();
            state.dismissed_session = dismissed;
            match state.current_session.take() {
                Some(_) => state.subscribers.clone(),
                None => Vec::new(),
            }
        };

        for callback in &subscribers {
            callback(None);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(listener) = self.state.get_mut().listener.take() {
            listener.stop();
        }
    }
}

async fn forward_sessions(
    inner: Weak<Inner>,
    identity: BackendIdentity,
    mut sessions: watch::Receiver<Option<Session>>,
) {
    while sessions.changed().await.is_ok() {
        let session = sessions.borrow_and_update().clone();
        let Some(inner) = inner.upgrade() else {
            break;
        };
        tracing::debug!(identity = %identity, signed_in = session.is_some(), "Session state changed");
        inner.publish(identity, session);
    }
}
