//! Delimiter dialect
//!
//! Older instruments take commands as control-character delimited fields
//! with a fixed numeric token per command. The instrument answers every
//! command with a frame; for queries it holds the value, for actions it
//! is an acknowledgment.
//!
//! The command set is narrower than the function-call dialect: there is no
//! mode switch, light source or acquisition control. A script is started
//! by setting the script file and then sending the start command.

pub mod command_creator;
pub mod command_table;
pub mod response_parser;

pub use response_parser::extract_value;

use super::{payload_text, unsupported, Dialect};
use crate::command::{Command, ScriptFile};
use crate::response::Value;
use imctl_core::{ControllerError, DialectKind, Result};

/// Script extensions accepted by delimiter instruments
const SCRIPT_EXTENSIONS: &[&str] = &["imsf", "scpt"];

/// Acknowledgment value sent when a command fails on the instrument
const ERROR_VALUE: &str = "error";

/// Dialect of instruments driven with delimited, tokenized commands
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterDialect;

impl DelimiterDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for DelimiterDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Delimiter
    }

    fn supports(&self, command: &Command) -> bool {
        command_creator::resolve(command).is_some()
    }

    fn encode(&self, command: &Command) -> Result<Vec<u8>> {
        command_creator::create_command(command).ok_or_else(|| unsupported(command, self.kind()))
    }

    fn parse_value(&self, command: &Command, payload: &[u8]) -> Result<Value> {
        if let Command::LiveModeActive = command {
            return Ok(Value::Bool(response_parser::parse_live_flag(payload)?));
        }

        let kind = command
            .value_kind()
            .ok_or_else(|| unsupported(command, self.kind()))?;
        Ok(response_parser::parse_value(payload, kind)?)
    }

    fn check_acknowledgment(&self, command: &Command, payload: &[u8]) -> Result<()> {
        // Acknowledgments without a value field carry no verdict.
        let rejected = extract_value(payload)
            .map(|value| {
                String::from_utf8_lossy(value)
                    .trim()
                    .eq_ignore_ascii_case(ERROR_VALUE)
            })
            .unwrap_or(false);

        if rejected {
            tracing::warn!(
                "Instrument rejected {}: {}",
                command.name(),
                payload_text(payload)
            );
            let command = command_creator::create_command(command)
                .map(|payload| payload_text(&payload))
                .unwrap_or_else(|| command.name().to_string());
            return Err(ControllerError::CommandRejected { command }.into());
        }
        Ok(())
    }

    fn script_extensions(&self) -> &'static [&'static str] {
        SCRIPT_EXTENSIONS
    }

    fn script_commands(&self, script: &ScriptFile) -> Vec<Command> {
        vec![Command::LoadScript(script.clone()), Command::StartScript]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imctl_core::Error;

    #[test]
    fn test_live_mode_from_status() {
        let dialect = DelimiterDialect::new();
        assert_eq!(
            dialect
                .parse_value(&Command::LiveModeActive, b"\x02IMStatus\x1fReady\x03")
                .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            dialect
                .parse_value(&Command::GetStatus, b"\x02IMStatus\x1fBusy\x03")
                .unwrap(),
            Value::Str("Busy".to_string())
        );
    }

    #[test]
    fn test_parse_missing_separator_is_protocol_error() {
        let dialect = DelimiterDialect::new();
        let err = dialect
            .parse_value(&Command::GetPositionX, b"\x0212.3\x03")
            .unwrap_err();
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_acknowledgments() {
        let dialect = DelimiterDialect::new();
        assert!(dialect.check_acknowledgment(&Command::OpenLid, b"").is_ok());
        assert!(dialect
            .check_acknowledgment(&Command::OpenLid, b"\x02OpenLid\x1fOK\x03")
            .is_ok());

        let err = dialect
            .check_acknowledgment(&Command::OpenLid, b"\x02OpenLid\x1ferror\x03")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Controller(ControllerError::CommandRejected { .. })
        ));
    }

    #[test]
    fn test_unsupported_commands() {
        let dialect = DelimiterDialect::new();
        assert!(!dialect.supports(&Command::BrightFieldOff));
        assert!(dialect.encode(&Command::FluoChannelOff).is_err());
        assert!(dialect.supports(&Command::StopScript));
    }
}
