//! Transport layer
//!
//! Provides the length-prefixed frame codec and the TCP connection to the
//! instrument's control software.

pub mod frame;
pub mod tcp;

use imctl_core::DialectKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use frame::{encode_frame, read_frame, write_frame, HEADER_LEN, MAX_PAYLOAD_LEN};
pub use tcp::connect;

/// Default delay between sending a command and reading its acknowledgment
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 50;

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Connection parameters for an instrument session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Host name or IP address of the instrument PC
    pub host: String,
    /// TCP port of the remote-control server
    pub port: u16,
    /// Wire dialect spoken on the port
    pub dialect: DialectKind,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Delay between a send and the matching receive, in milliseconds
    pub settle_delay_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::for_dialect(DialectKind::default())
    }
}

impl ConnectionParams {
    /// Parameters for a local instrument on the dialect's default port
    pub fn for_dialect(dialect: DialectKind) -> Self {
        Self {
            host: "localhost".to_string(),
            port: dialect.default_port(),
            dialect,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the settle delay
    pub fn with_settle_delay_ms(mut self, settle_delay_ms: u64) -> Self {
        self.settle_delay_ms = settle_delay_ms;
        self
    }

    /// `host:port` string used to dial the instrument
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Connection timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
