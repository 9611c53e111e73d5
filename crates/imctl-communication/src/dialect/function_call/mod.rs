//! Function-call dialect

pub mod command_creator;
pub mod response_parser;

use super::{payload_text, unsupported, Dialect};
use crate::command::{Command, ScriptFile};
use crate::response::Value;
use imctl_core::{ControllerError, DialectKind, Result};

/// Script extensions accepted by function-call instruments
const SCRIPT_EXTENSIONS: &[&str] = &["imsf", "cs"];

/// Dialect of instruments driven with function-call text
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionCallDialect;

impl FunctionCallDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for FunctionCallDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::FunctionCall
    }

    fn supports(&self, command: &Command) -> bool {
        command_creator::create_command(command).is_some()
    }

    fn encode(&self, command: &Command) -> Result<Vec<u8>> {
        command_creator::create_command(command)
            .map(String::into_bytes)
            .ok_or_else(|| unsupported(command, self.kind()))
    }

    fn parse_value(&self, command: &Command, payload: &[u8]) -> Result<Value> {
        let kind = command
            .value_kind()
            .ok_or_else(|| unsupported(command, self.kind()))?;
        Ok(response_parser::parse_value(payload, kind)?)
    }

    fn check_acknowledgment(&self, command: &Command, payload: &[u8]) -> Result<()> {
        if response_parser::is_error_acknowledgment(payload) {
            tracing::warn!(
                "Instrument rejected {}: {}",
                command.name(),
                payload_text(payload)
            );
            let command = command_creator::create_command(command)
                .unwrap_or_else(|| command.name().to_string());
            return Err(ControllerError::CommandRejected { command }.into());
        }
        Ok(())
    }

    fn script_extensions(&self) -> &'static [&'static str] {
        SCRIPT_EXTENSIONS
    }

    fn script_commands(&self, script: &ScriptFile) -> Vec<Command> {
        vec![Command::RunScript(script.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imctl_core::Error;

    #[test]
    fn test_encode_and_unsupported() {
        let dialect = FunctionCallDialect::new();
        assert_eq!(dialect.encode(&Command::OpenLid).unwrap(), b"OpenLid()");

        let err = dialect.encode(&Command::GetVersion).unwrap_err();
        assert!(matches!(
            err,
            Error::Controller(ControllerError::Unsupported { .. })
        ));
        assert!(!dialect.supports(&Command::StartScript));
    }

    #[test]
    fn test_rejected_acknowledgment() {
        let dialect = FunctionCallDialect::new();
        let command = Command::go_to_z(20.1).unwrap();
        assert!(dialect.check_acknowledgment(&command, b"ok").is_ok());

        match dialect.check_acknowledgment(&command, b"error") {
            Err(Error::Controller(ControllerError::CommandRejected { command })) => {
                assert_eq!(command, "GotoZ(20.1)");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
