//! Error types for the settings crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving the configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The configuration file could not be written.
    #[error("Failed to write config file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// JSON serialization/deserialization error.
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("Invalid TOML config: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("Failed to serialize TOML config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// A configuration validation error occurred.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The configuration directory could not be determined.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),
}

/// Errors related to configuration validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
