use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which identity-provider instance is authoritative for sign-in attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendIdentity {
    #[default]
    Main,
    Backup,
}

impl BackendIdentity {
    /// Wire name used by the coordinator ("main" / "backup").
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendIdentity::Main => "main",
            BackendIdentity::Backup => "backup",
        }
    }

    /// The alternate instance.
    pub fn other(&self) -> Self {
        match self {
            BackendIdentity::Main => BackendIdentity::Backup,
            BackendIdentity::Backup => BackendIdentity::Main,
        }
    }
}

impl fmt::Display for BackendIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for identity names that are neither "main" nor "backup".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown backend identity '{0}'")]
pub struct UnknownIdentity(pub String);

impl FromStr for BackendIdentity {
    type Err = UnknownIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" => Ok(BackendIdentity::Main),
            "backup" => Ok(BackendIdentity::Backup),
            _ => Err(UnknownIdentity(s.to_string())),
        }
    }
}
