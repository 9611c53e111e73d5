//! imctl Settings Crate
//!
//! Handles the configuration file: instrument address, wire dialect,
//! session timing and log filter.

pub mod config;
pub mod error;

pub use config::{Config, ConnectionSettings, LoggingSettings, SessionSettings};
pub use error::{ConfigError, SettingsError};
