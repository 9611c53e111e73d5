//! Delimiter response parser
//!
//! Feedback frames carry the value between the first field separator and
//! the terminal end marker.

use super::command_creator::{END_MARKER, FIELD_SEPARATOR};
use crate::response::{cast_value, Value, ValueKind};
use imctl_core::ProtocolError;

/// Status reported while the instrument is idle in live mode
pub const STATUS_READY: &str = "Ready";
/// Status reported while a script is running
pub const STATUS_BUSY: &str = "Busy";

/// Extract the raw value bytes of a feedback payload
pub fn extract_value(payload: &[u8]) -> Result<&[u8], ProtocolError> {
    let start = payload
        .iter()
        .position(|b| *b == FIELD_SEPARATOR)
        .ok_or(ProtocolError::MissingSeparator)?;

    match payload.last() {
        Some(&END_MARKER) if payload.len() - 1 > start => {
            Ok(&payload[start + 1..payload.len() - 1])
        }
        _ => Err(ProtocolError::MissingEndMarker),
    }
}

/// Extract and cast a feedback value
pub fn parse_value(payload: &[u8], kind: ValueKind) -> Result<Value, ProtocolError> {
    cast_value(extract_value(payload)?, kind)
}

/// Map the instrument status to the live-mode flag
pub fn parse_live_flag(payload: &[u8]) -> Result<bool, ProtocolError> {
    let status = parse_value(payload, ValueKind::Str)?.into_string();
    if status.eq_ignore_ascii_case(STATUS_READY) {
        Ok(true)
    } else if status.eq_ignore_ascii_case(STATUS_BUSY) {
        Ok(false)
    } else {
        Err(ProtocolError::InvalidValue {
            raw: status,
            kind: "instrument status".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_value() {
        assert_eq!(extract_value(b"\x02XAxis\x1f12.345\x03").unwrap(), b"12.345");
        assert_eq!(extract_value(b"\x1f\x03").unwrap(), b"");
    }

    #[test]
    fn test_extract_value_errors() {
        assert_eq!(
            extract_value(b"\x0212.345\x03"),
            Err(ProtocolError::MissingSeparator)
        );
        assert_eq!(
            extract_value(b"\x02XAxis\x1f12.345"),
            Err(ProtocolError::MissingEndMarker)
        );
        // The end marker cannot double as the character after the separator.
        assert_eq!(
            extract_value(b"\x02X\x1f"),
            Err(ProtocolError::MissingEndMarker)
        );
    }

    #[test]
    fn test_parse_float_value() {
        assert_eq!(
            parse_value(b"\x02ZAxis\x1f20.1\x03", ValueKind::Float).unwrap(),
            Value::Float(20.1)
        );
    }

    #[test]
    fn test_parse_live_flag() {
        assert!(parse_live_flag(b"\x02IMStatus\x1fReady\x03").unwrap());
        assert!(!parse_live_flag(b"\x02IMStatus\x1fBusy\x03").unwrap());
        assert!(parse_live_flag(b"\x02IMStatus\x1fParked\x03").is_err());
    }
}
