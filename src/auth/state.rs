//! Mutable state owned by the failover manager.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::task::JoinHandle;

use super::identity::BackendIdentity;
use super::session::Session;

/// Callback invoked with every observed session transition.
pub type SessionCallback = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// Log entry for an identity switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchLogEntry {
    /// When the switch occurred.
    pub timestamp: SystemTime,
    /// Identity before the switch.
    pub old_identity: BackendIdentity,
    /// Identity after the switch. Equal to `old_identity` for a repeated switch.
    pub new_identity: BackendIdentity,
}

/// Task forwarding one provider's session stream into the manager.
pub(crate) struct Listener {
    pub identity: BackendIdentity,
    pub task: Option<JoinHandle<()>>,
}

impl Listener {
    pub fn stop(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }
}

pub(crate) struct FailoverState {
    pub active_identity: BackendIdentity,
    /// Failover retries since the last successful sign-in.
    pub retry_count: u32,
    /// Last session confirmed by the bound provider's stream.
    pub current_session: Option<Session>,
    /// Session dropped by a sign-out the provider refused; its replays are ignored.
    pub dismissed_session: Option<Session>,
    pub subscribers: Vec<SessionCallback>,
    pub switch_log: Vec<SwitchLogEntry>,
    pub listener: Option<Listener>,
}

impl FailoverState {
    pub fn new(initial_identity: BackendIdentity) -> Self {
        Self {
            active_identity: initial_identity,
            retry_count: 0,
            current_session: None,
            dismissed_session: None,
            subscribers: Vec::new(),
            switch_log: Vec::new(),
            listener: None,
        }
    }

    /// Point the state at `new_identity`, recording the switch.
    pub fn set_identity(&mut self, new_identity: BackendIdentity) {
        let old_identity = self.active_identity;
        self.switch_log.push(SwitchLogEntry {
            timestamp: SystemTime::now(),
            old_identity,
            new_identity,
        });
        self.active_identity = new_identity;
    }

    pub fn listener_identity(&self) -> Option<BackendIdentity> {
        self.listener.as_ref().map(|l| l.identity)
    }

    /// Replace the bound listener, stopping the previous one.
    pub fn replace_listener(&mut self, listener: Listener) {
        if let Some(old) = self.listener.replace(listener) {
            old.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = FailoverState::new(BackendIdentity::Main);
        assert_eq!(state.active_identity, BackendIdentity::Main);
        assert_eq!(state.retry_count, 0);
        assert!(state.current_session.is_none());
        assert!(state.switch_log.is_empty());
        assert!(state.listener_identity().is_none());
    }

    #[test]
    fn test_set_identity_logs_every_switch() {
        let mut state = FailoverState::new(BackendIdentity::Main);
        state.set_identity(BackendIdentity::Backup);
        state.set_identity(BackendIdentity::Backup);

        assert_eq!(state.active_identity, BackendIdentity::Backup);
        assert_eq!(state.switch_log.len(), 2);
        assert_eq!(state.switch_log[0].old_identity, BackendIdentity::Main);
        assert_eq!(state.switch_log[0].new_identity, BackendIdentity::Backup);
        assert_eq!(state.switch_log[1].old_identity, BackendIdentity::Backup);
        assert_eq!(state.switch_log[1].new_identity, BackendIdentity::Backup);
    }
}
