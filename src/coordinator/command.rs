use std::fmt;

use serde_json::Value;

/// Maintenance commands the coordinator exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SyncCommand {
    /// Incremental sync of all collections.
    Sync,
    FullSync,
    /// Sync of authentication users only.
    AuthSync,
    /// Recover the primary database from the secondary.
    Recover,
    IntegrityCheck,
    AuthIntegrityCheck,
}

impl SyncCommand {
    pub fn path(&self) -> &'static str {
        match self {
            SyncCommand::Sync => "/api/sync",
            SyncCommand::FullSync => "/api/sync/full",
            SyncCommand::AuthSync => "/api/sync/auth",
            SyncCommand::Recover => "/api/recover",
            SyncCommand::IntegrityCheck => "/api/integrity-check",
            SyncCommand::AuthIntegrityCheck => "/api/auth-integrity-check",
        }
    }
}

impl fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncCommand::Sync => "sync",
            SyncCommand::FullSync => "full-sync",
            SyncCommand::AuthSync => "auth-sync",
            SyncCommand::Recover => "recover",
            SyncCommand::IntegrityCheck => "integrity-check",
            SyncCommand::AuthIntegrityCheck => "auth-integrity-check",
        };
        f.write_str(name)
    }
}

/// Result of a command the coordinator accepted.
///
/// `success == false` means the coordinator ran the command and reported
/// a failure; transport problems are `CoordinatorError`s instead.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub success: bool,
    /// `message` on success, `error` on failure.
    pub message: Option<String>,
    /// Full response body.
    pub body: Value,
}

impl CommandOutcome {
    pub fn from_body(body: Value) -> Self {
        let success = body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let key = if success { "message" } else { "error" };
        let message = body.get(key).and_then(Value::as_str).map(String::from);

        Self {
            success,
            message,
            body,
        }
    }
}
