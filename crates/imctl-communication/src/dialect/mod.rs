//! Wire dialects
//!
//! The instrument's control software speaks one of two dialects on its
//! remote-control port. Both use the same framing; they differ in how a
//! [`Command`] is written and how its feedback is read back.
//!
//! - [`DelimiterDialect`]: fields separated by control characters, each
//!   command identified by an opaque numeric token.
//! - [`FunctionCallDialect`]: plain function-call text such as
//!   `GotoXY(12.345,23.456)`.
//!
//! The session controller only talks to the [`Dialect`] trait, so the same
//! operations run against either instrument generation.

pub mod delimiter;
pub mod function_call;

pub use delimiter::DelimiterDialect;
pub use function_call::FunctionCallDialect;

use crate::command::{Command, ScriptFile};
use crate::response::Value;
use imctl_core::{ControllerError, DialectKind, Result};
use std::fmt;

/// Strategy for encoding commands and decoding feedback
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Which dialect this is
    fn kind(&self) -> DialectKind;

    /// Check if the dialect has an encoding for the command
    fn supports(&self, command: &Command) -> bool;

    /// Encode the command into a frame payload
    ///
    /// Fails with [`ControllerError::Unsupported`] when [`Dialect::supports`]
    /// returns false.
    fn encode(&self, command: &Command) -> Result<Vec<u8>>;

    /// Extract and cast the feedback value of a query
    fn parse_value(&self, command: &Command, payload: &[u8]) -> Result<Value>;

    /// Check the acknowledgment of an action command
    ///
    /// Fails with [`ControllerError::CommandRejected`] when the instrument
    /// reports that it could not execute the command.
    fn check_acknowledgment(&self, command: &Command, payload: &[u8]) -> Result<()>;

    /// Script file extensions the instrument accepts, without the dot
    fn script_extensions(&self) -> &'static [&'static str];

    /// Commands that load and start a script
    fn script_commands(&self, script: &ScriptFile) -> Vec<Command>;
}

/// Create the dialect implementation for a kind
pub fn create_dialect(kind: DialectKind) -> Box<dyn Dialect> {
    match kind {
        DialectKind::FunctionCall => Box::new(FunctionCallDialect::new()),
        DialectKind::Delimiter => Box::new(DelimiterDialect::new()),
    }
}

pub(crate) fn unsupported(command: &Command, kind: DialectKind) -> imctl_core::Error {
    ControllerError::Unsupported {
        command: command.name().to_string(),
        dialect: kind.to_string(),
    }
    .into()
}

/// Payload rendered as printable text for logs and errors
pub(crate) fn payload_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).escape_debug().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_kinds() {
        assert_eq!(
            create_dialect(DialectKind::FunctionCall).kind(),
            DialectKind::FunctionCall
        );
        assert_eq!(
            create_dialect(DialectKind::Delimiter).kind(),
            DialectKind::Delimiter
        );
    }

    #[test]
    fn test_payload_text_escapes_control_characters() {
        assert_eq!(payload_text(b"\x02Get\x1f"), "\\u{2}Get\\u{1f}");
    }
}
