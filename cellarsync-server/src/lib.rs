//! The cellarsync service.
//!
//! Wires the sync engine to Google's APIs and runs it on a schedule next to
//! a liveness endpoint and an optional keep-alive self-ping.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod health;
pub mod keepalive;
pub mod scheduler;

pub use config::{ConfigError, ServiceConfig};
pub use error::StartupError;
pub use scheduler::{JobRun, SyncJob};
