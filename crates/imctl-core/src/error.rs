//! Error handling for imctl
//!
//! Provides the error taxonomy shared by every layer of the driver:
//! - Validation errors (arguments rejected before any I/O)
//! - Connection errors (socket connect/send/receive failures)
//! - Protocol errors (malformed frames or feedback payloads)
//! - Controller errors (instrument rejections and session preconditions)
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Validation error type
///
/// Raised by command builders when an argument falls outside the
/// instrument's contract. Nothing has been sent when this is returned,
/// so the caller can fix the input and retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric argument outside its allowed range
    #[error("{parameter} must be in range [{min}, {max}], got {value}")]
    OutOfRange {
        /// The parameter name.
        parameter: String,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
        /// The rejected value.
        value: f64,
    },

    /// Argument with an invalid shape (format, membership, length)
    #[error("Invalid {parameter}: {reason}")]
    Invalid {
        /// The parameter name.
        parameter: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ValidationError {
    /// Build an [`ValidationError::OutOfRange`] for a parameter
    pub fn out_of_range(parameter: impl Into<String>, min: f64, max: f64, value: f64) -> Self {
        Self::OutOfRange {
            parameter: parameter.into(),
            min,
            max,
            value,
        }
    }

    /// Build an [`ValidationError::Invalid`] for a parameter
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Operator guidance appended to connection failures.
const CONNECT_HINT: &str = "Make sure the instrument is powered on and its control software is running, \
that the 'Block remote connection' option of the admin panel is deactivated, \
and that the port matches the one configured on the instrument";

/// Connection error type
///
/// Represents failures of the TCP link to the instrument. These are fatal
/// to the current session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// The instrument refused or did not answer the connection attempt
    #[error("Cannot connect to the instrument at {address}: {reason}. {}", CONNECT_HINT)]
    ConnectFailed {
        /// The address that was dialled.
        address: String,
        /// The underlying failure.
        reason: String,
    },

    /// Connection attempt timed out
    #[error("Connection to {address} timed out after {timeout_ms}ms. {}", CONNECT_HINT)]
    ConnectionTimeout {
        /// The address that was dialled.
        address: String,
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Host/port could not be resolved to a socket address
    #[error("Invalid instrument address: {address}")]
    InvalidAddress {
        /// The invalid address.
        address: String,
    },

    /// The instrument closed the connection
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// Send or receive failed at the socket level
    #[error("I/O error on instrument connection: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },

    /// A previous failure left the stream misaligned
    #[error("Connection is desynchronized after a previous failure; open a new session")]
    Desynchronized,
}

/// Protocol error type
///
/// Represents malformed wire data: short frames, missing delimiters or
/// values that cannot be cast. Stream alignment may be lost after one of
/// these, so they are not retryable on the same connection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Fewer than four header bytes were available
    #[error("Short frame header: expected 4 bytes, received {received}")]
    ShortHeader {
        /// Number of header bytes read before the stream ended.
        received: usize,
    },

    /// The connection closed before the declared payload was read
    #[error("Short frame payload: expected {expected} bytes, received {received}")]
    ShortPayload {
        /// Declared payload length.
        expected: usize,
        /// Bytes read before the stream ended.
        received: usize,
    },

    /// Payload larger than the codec accepts
    #[error("Frame payload of {length} bytes exceeds the maximum of {max} bytes")]
    FrameTooLarge {
        /// Payload length in bytes.
        length: usize,
        /// Maximum accepted payload length.
        max: usize,
    },

    /// Feedback payload carries no field separator
    #[error("Feedback payload has no field separator")]
    MissingSeparator,

    /// Feedback payload does not end with the end marker
    #[error("Feedback payload has no end marker")]
    MissingEndMarker,

    /// Feedback value could not be cast to the requested type
    #[error("Cannot parse feedback '{raw}' as {kind}")]
    InvalidValue {
        /// The raw feedback text.
        raw: String,
        /// The requested value kind.
        kind: String,
    },
}

/// Controller error type
///
/// Represents instrument-side rejections and session preconditions. An
/// instrument rejection arrives as a normal acknowledgment frame, so the
/// stream stays aligned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// The instrument answered the command with an error acknowledgment
    #[error("Instrument could not execute command: {command}")]
    CommandRejected {
        /// The rejected command payload, as text.
        command: String,
    },

    /// A script is already running on the instrument
    #[error("A script is already running; wait for it to finish or stop it first")]
    ScriptAlreadyRunning,

    /// The selected dialect has no encoding for the command
    #[error("Command {command} is not supported by the {dialect} dialect")]
    Unsupported {
        /// The command name.
        command: String,
        /// The dialect name.
        dialect: String,
    },
}

/// Main error type for imctl
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// A file the command refers to does not exist
    #[error("File not found: {}", .path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },
}

impl Error {
    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// Check if this is a controller error
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Error::Controller(_))
    }

    /// Check if the error leaves the wire stream in an unknown position
    ///
    /// After such an error the session cannot be reused.
    pub fn breaks_stream(&self) -> bool {
        matches!(self, Error::Protocol(_) | Error::Connection(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::out_of_range("x", 10.0, 119.0, 9.999);
        assert_eq!(err.to_string(), "x must be in range [10, 119], got 9.999");

        let err = ValidationError::invalid("binning", "must be one of 1, 2, 4");
        assert_eq!(err.to_string(), "Invalid binning: must be one of 1, 2, 4");
    }

    #[test]
    fn test_connect_failure_guides_operator() {
        let err = ConnectionError::ConnectFailed {
            address: "localhost:6200".to_string(),
            reason: "connection refused".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("localhost:6200"));
        assert!(text.contains("powered on"));
        assert!(text.contains("Block remote connection"));
        assert!(text.contains("port"));
    }

    #[test]
    fn test_error_classification() {
        let err: Error = ProtocolError::MissingSeparator.into();
        assert!(err.is_protocol_error());
        assert!(err.breaks_stream());

        let err: Error = ControllerError::ScriptAlreadyRunning.into();
        assert!(err.is_controller_error());
        assert!(!err.breaks_stream());

        let err: Error = ValidationError::invalid("well id", "too short").into();
        assert!(err.is_validation_error());
        assert!(!err.breaks_stream());

        let err: Error = ConnectionError::Desynchronized.into();
        assert!(err.is_connection_error());
        assert!(err.breaks_stream());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound {
            path: PathBuf::from("/tmp/missing.imsf"),
        };
        assert_eq!(err.to_string(), "File not found: /tmp/missing.imsf");
    }
}
