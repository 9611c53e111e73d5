//! # imctl
//!
//! Remote control for automated widefield imaging instruments over their
//! TCP remote-control ports.
//!
//! ## Architecture
//!
//! imctl is organized as a workspace with multiple crates:
//!
//! 1. **imctl-core** - Data model (modes, positions, light sources) and error types
//! 2. **imctl-communication** - Framing, wire dialects, session controller
//! 3. **imctl-settings** - Configuration file handling
//! 4. **imctl** - Command-line client that integrates all crates
//!
//! ## Features
//!
//! - **Two Dialects**: delimiter-framed tokens and function-call text
//! - **Mode Management**: live/script switching with idempotent transitions
//! - **Acquisition**: single acquisitions with live-mode restoration
//! - **Scripts**: validated script paths, run and stop
//! - **Safe Teardown**: best-effort return to live mode with lights off

pub use imctl_core::data;

pub use imctl_core::{
    ChannelMask, ConnectionError, ControllerError, DialectKind, Error, ImageFilenameAttributes,
    LightSource, Mode, PartialPosition, Position, ProtocolError, Result, SessionState,
    ValidationError,
};

pub use imctl_communication::{
    connect, create_dialect, shared, AcquisitionRequest, CameraRoi, ChannelSettings, Command,
    ConnectionParams, Dialect, FilenameAttribute, ScriptFile, SessionController, SessionOptions,
    SharedSession, TemperatureProbe, ZStack,
};

pub use imctl_settings::{Config, ConnectionSettings, LoggingSettings, SessionSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the logging settings
///
/// `RUST_LOG` takes precedence over the configured filter. Output goes to
/// stderr so command results on stdout stay machine readable.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(&settings.filter)?,
    };

    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Build connection parameters from a loaded configuration
pub fn connection_params(config: &Config) -> ConnectionParams {
    let connection = &config.connection;
    ConnectionParams {
        host: connection.host.clone(),
        port: connection.effective_port(),
        dialect: connection.dialect,
        connect_timeout_ms: connection.connect_timeout_ms,
        settle_delay_ms: config.session.settle_delay_ms,
    }
}
