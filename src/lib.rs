//! Client-side authentication failover between a main and a backup
//! identity provider, coordinated with a remote sync coordinator.

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod logging;
pub mod provider;
