//! Function-call response parser
//!
//! Feedback frames carry the bare value text. Actions are acknowledged with
//! a short text; the literal `error` means the instrument could not execute
//! the command.

use crate::response::{cast_value, Value, ValueKind};
use imctl_core::ProtocolError;

/// Acknowledgment text sent when a command fails on the instrument
pub const ERROR_ACKNOWLEDGMENT: &str = "error";

/// Cast a feedback payload to the requested kind
pub fn parse_value(payload: &[u8], kind: ValueKind) -> Result<Value, ProtocolError> {
    cast_value(payload, kind)
}

/// Check whether an acknowledgment reports a failure
pub fn is_error_acknowledgment(payload: &[u8]) -> bool {
    String::from_utf8_lossy(payload)
        .trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
        .eq_ignore_ascii_case(ERROR_ACKNOWLEDGMENT)
}
