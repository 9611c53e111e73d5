//! Configuration management
//!
//! The configuration is stored as TOML or JSON, chosen by file extension:
//!
//! ```toml
//! [connection]
//! host = "192.168.0.10"
//! dialect = "function_call"
//! connect_timeout_ms = 5000
//!
//! [session]
//! settle_delay_ms = 50
//!
//! [logging]
//! filter = "info"
//! ```
//!
//! When `port` is omitted the dialect's default port is used.

use crate::error::{ConfigError, Result, SettingsError};
use imctl_core::DialectKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Instrument connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Host name or IP address of the instrument PC
    pub host: String,
    /// TCP port, dialect default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Wire dialect
    pub dialect: DialectKind,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            dialect: DialectKind::default(),
            connect_timeout_ms: 5000,
        }
    }
}

impl ConnectionSettings {
    /// Configured port, or the dialect's default port
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.dialect.default_port())
    }
}

/// Per-exchange timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Delay between sending a command and reading its response
    pub settle_delay_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 50,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

enum Format {
    Toml,
    Json,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string()).into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, ex: `~/.config/imctl/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("imctl").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            Format::Toml => toml::from_str(&content)?,
            Format::Json => serde_json::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Toml => toml::to_string_pretty(self)?,
            Format::Json => serde_json::to_string_pretty(self)?,
        };

        let write_error = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, content).map_err(write_error)?;

        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.connection.host.trim().is_empty() {
            return Err(ConfigError::invalid("connection.host", "must not be empty"));
        }

        if self.connection.port == Some(0) {
            return Err(ConfigError::invalid("connection.port", "must be > 0"));
        }

        if self.connection.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "connection.connect_timeout_ms",
                "must be > 0",
            ));
        }

        if self.session.settle_delay_ms > 10_000 {
            return Err(ConfigError::invalid(
                "session.settle_delay_ms",
                "must be at most 10000",
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::invalid("logging.filter", "must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.effective_port(), 6200);
        assert_eq!(config.session.settle_delay_ms, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_follows_dialect() {
        let mut config = Config::new();
        config.connection.dialect = DialectKind::Delimiter;
        assert_eq!(config.connection.effective_port(), 6261);

        config.connection.port = Some(7000);
        assert_eq!(config.connection.effective_port(), 7000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [connection]
            host = "10.0.0.5"
            dialect = "delimiter"
            "#,
        )
        .unwrap();
        assert_eq!(config.connection.host, "10.0.0.5");
        assert_eq!(config.connection.dialect, DialectKind::Delimiter);
        assert_eq!(config.connection.connect_timeout_ms, 5000);
        assert_eq!(config.session, SessionSettings::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::new();
        config.connection.host = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.connection.port = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.connection.connect_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
