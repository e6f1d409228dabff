//! Configuration loading, validation and secret handling.

mod credentials;
mod loader;
mod types;

pub use credentials::SecureString;
pub use loader::ConfigError;
pub use types::{Config, CoordinatorConfig, FailoverConfig, ProviderConfig};
