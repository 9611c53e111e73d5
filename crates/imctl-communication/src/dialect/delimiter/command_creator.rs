//! Delimiter command creator
//!
//! Payload layout: `STX <category> US <name> US <token> [US <arg>]* ETX`.

use super::command_table::{self as table, CommandSpec};
use crate::command::Command;

/// Start of text marker
pub const START_MARKER: u8 = 0x02;
/// Field separator
pub const FIELD_SEPARATOR: u8 = 0x1f;
/// End of text marker
pub const END_MARKER: u8 = 0x03;

/// Assemble a payload from a table entry and its arguments
pub fn build_payload(spec: &CommandSpec, args: &[String]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(
        spec.category.as_str().len()
            + spec.name.len()
            + spec.token.len()
            + args.iter().map(|a| a.len() + 1).sum::<usize>()
            + 4,
    );
    payload.push(START_MARKER);
    payload.extend_from_slice(spec.category.as_str().as_bytes());
    payload.push(FIELD_SEPARATOR);
    payload.extend_from_slice(spec.name.as_bytes());
    payload.push(FIELD_SEPARATOR);
    payload.extend_from_slice(spec.token.as_bytes());
    for arg in args {
        payload.push(FIELD_SEPARATOR);
        payload.extend_from_slice(arg.as_bytes());
    }
    payload.push(END_MARKER);
    payload
}

/// Table entry and arguments for a command, `None` when it has no token
pub fn resolve(command: &Command) -> Option<(&'static CommandSpec, Vec<String>)> {
    let (name, args) = match command {
        Command::GetVersion => ("IMVersion", vec![]),
        Command::GetStatus | Command::LiveModeActive => ("IMStatus", vec![]),
        Command::GetPositionX => ("XAxis", vec![]),
        Command::GetPositionY => ("YAxis", vec![]),
        Command::GetPositionZ => ("ZAxis", vec![]),
        Command::GetObjective => ("ObjectiveNo", vec![]),
        Command::GetLightChannel => ("LightNo", vec![]),
        Command::GetWellCoordinate => ("WellCoordinate", vec![]),
        Command::GetZStackCenter => ("ZStackCenter", vec![]),
        Command::OpenLid => ("OpenLid", vec![]),
        Command::CloseLid => ("CloseLid", vec![]),
        Command::GoToXy { x, y } => (
            "GotoXYAxis",
            vec![format!("{:.3}", x), format!("{:.3}", y)],
        ),
        Command::GoToZ { z } => ("GotoZAxis", vec![format!("{:.1}", z)]),
        Command::LoadScript(script) => {
            ("ScriptFile", vec![script.path().display().to_string()])
        }
        Command::StartScript => ("StartScript", vec![]),
        Command::StopScript => ("StopScript", vec![]),
        _ => return None,
    };
    table::lookup(name).map(|spec| (spec, args))
}

/// Encode a command, `None` when the dialect has no encoding for it
pub fn create_command(command: &Command) -> Option<Vec<u8>> {
    resolve(command).map(|(spec, args)| build_payload(spec, &args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptFile;

    #[test]
    fn test_get_version_payload() {
        let payload = create_command(&Command::GetVersion).unwrap();
        assert_eq!(payload, b"\x02Get\x1fIMVersion\x1f10982031\x03");
        assert_eq!(payload.len(), 0x18);
    }

    #[test]
    fn test_goto_xy_payload() {
        let payload = create_command(&Command::go_to_xy(12.345, 23.456).unwrap()).unwrap();
        assert_eq!(
            payload,
            b"\x02Command\x1fGotoXYAxis\x1f19901915\x1f12.345\x1f23.456\x03"
        );
    }

    #[test]
    fn test_goto_z_payload() {
        let payload = create_command(&Command::go_to_z(20.1).unwrap()).unwrap();
        assert_eq!(payload, b"\x02Command\x1fGotoZAxis\x1f1655963\x1f20.1\x03");
    }

    #[test]
    fn test_live_mode_maps_to_status() {
        assert_eq!(
            create_command(&Command::LiveModeActive),
            create_command(&Command::GetStatus)
        );
    }

    #[test]
    fn test_commands_without_token() {
        assert!(create_command(&Command::BrightFieldOff).is_none());
        assert!(create_command(&Command::SetScriptMode(imctl_core::Mode::Live)).is_none());
        assert!(create_command(&Command::GoToXyz {
            x: 50.0,
            y: 50.0,
            z: 10.0
        })
        .is_none());
    }

    #[test]
    fn test_every_table_entry_is_reachable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plate.scpt");
        std::fs::write(&path, "").unwrap();

        let commands = vec![
            Command::GetVersion,
            Command::GetStatus,
            Command::GetPositionX,
            Command::GetPositionY,
            Command::GetPositionZ,
            Command::GetObjective,
            Command::GetLightChannel,
            Command::GetWellCoordinate,
            Command::GetZStackCenter,
            Command::OpenLid,
            Command::CloseLid,
            Command::go_to_xy(50.0, 40.0).unwrap(),
            Command::go_to_z(100.0).unwrap(),
            Command::LoadScript(ScriptFile::new(&path, &["scpt"]).unwrap()),
            Command::StartScript,
            Command::StopScript,
        ];

        let mut names: Vec<&str> = commands
            .iter()
            .map(|command| resolve(command).unwrap().0.name)
            .collect();
        names.sort_unstable();

        let mut table: Vec<&str> = table::COMMAND_TABLE.iter().map(|spec| spec.name).collect();
        table.sort_unstable();
        assert_eq!(names, table);
    }
}
