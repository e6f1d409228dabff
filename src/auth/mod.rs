//! Authentication failover.
//!
//! [`AuthFailoverManager`] tracks which of two identity providers is
//! authoritative, signs in against it, and fails over to the backup
//! provider when sign-in keeps failing.

mod error;
mod identity;
mod manager;
mod session;
mod state;

pub use error::{AuthError, ConfigQueryError, SignOutError, SwitchError, SwitchNotificationError};
pub use identity::{BackendIdentity, UnknownIdentity};
pub use manager::{AuthFailoverManager, FailoverSettings};
pub use session::{Credentials, Session};
pub use state::{SessionCallback, SwitchLogEntry};
