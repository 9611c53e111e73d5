//! Function-call command creator
//!
//! Renders commands as the ASCII function calls understood by the
//! instrument, ex: `GotoXY(12.345,23.456)` or `SetObjective(2)`.
//! Positions are written with 3 decimals in X/Y and 1 decimal in Z.

use crate::command::{
    CameraRoi, ChannelSettings, Command, FilenameAttribute, PlateAxis, TemperatureProbe, ZStack,
};
use imctl_core::{ChannelMask, Mode};
use std::path::Path;

/// Autofocus offset sent with every light channel
const AUTOFOCUS_OFFSET: u32 = 0;

/// Render a command, `None` when the dialect has no encoding for it
pub fn create_command(command: &Command) -> Option<String> {
    let text = match command {
        Command::LiveModeActive => "LiveModeActive()".to_string(),
        Command::GetPositionX => "GetXPosition()".to_string(),
        Command::GetPositionY => "GetYPosition()".to_string(),
        Command::GetPositionZ => "GetZPosition()".to_string(),
        Command::GetObjective => "GetObjective()".to_string(),
        Command::IsLidClosed => "LidClosed()".to_string(),
        Command::IsLidOpened => "LidOpened()".to_string(),
        Command::IsTemperatureRegulated => "GetTemperatureRegulation()".to_string(),
        Command::GetTemperature(probe) => get_temperature(*probe),
        Command::GetWellCount(PlateAxis::Columns) => "GetCountWellsX()".to_string(),
        Command::GetWellCount(PlateAxis::Rows) => "GetCountWellsY()".to_string(),
        Command::SoftwareAutofocus(z_stack) => software_autofocus(z_stack),

        Command::OpenLid => "OpenLid()".to_string(),
        Command::CloseLid => "CloseLid()".to_string(),
        Command::GoToXy { x, y } => format!("GotoXY({:.3},{:.3})", x, y),
        Command::GoToZ { z } => format!("GotoZ({:.1})", z),
        Command::GoToXyz { x, y, z } => format!("GotoXYZ({:.3},{:.3},{:.1})", x, y, z),
        Command::SetTemperatureRegulation(on) => {
            format!("SetTemperatureRegulation({})", u8::from(*on))
        }
        Command::SetTargetTemperature(celsius) => {
            format!("SetTargetTemperature({:.1}, TemperatureUnit.Celsius)", celsius)
        }
        Command::SetCamera(roi) => set_camera(roi),
        Command::SetObjective(index) => format!("SetObjective({})", index),
        Command::SetFilenameAttribute(attribute) => set_filename_attribute(attribute),
        Command::SetBrightField(settings) => set_bright_field(settings),
        Command::SetFluoChannel { mask, settings } => set_fluo_channel(mask, settings),
        Command::BrightFieldOff => "SetBrightField(1, 1, 0, 0, 0, false)".to_string(),
        Command::FluoChannelOff => "SetFluoChannel(1, \"111111\", 1, 0, 0, 0, false)".to_string(),
        Command::Acquire {
            z_stack,
            save_directory,
        } => acquire(z_stack, save_directory.as_deref()),
        Command::SetScriptMode(mode) => {
            format!("SetScriptMode({})", u8::from(*mode == Mode::Script))
        }
        Command::RunScript(script) => format!("RunScript({})", script.path().display()),
        Command::StopScript => "StopScript()".to_string(),

        Command::GetVersion
        | Command::GetStatus
        | Command::GetLightChannel
        | Command::GetWellCoordinate
        | Command::GetZStackCenter
        | Command::LoadScript(_)
        | Command::StartScript => return None,
    };
    Some(text)
}

fn get_temperature(probe: TemperatureProbe) -> String {
    let function = match probe {
        TemperatureProbe::Ambient => "GetAmbientTemperature",
        TemperatureProbe::Sample => "GetSampleTemperature",
        TemperatureProbe::Target => "GetTargetTemperature",
    };
    format!("{}(TemperatureUnit.Celsius)", function)
}

fn set_camera(roi: &CameraRoi) -> String {
    format!(
        "SetCamera({},{},{},{},{})",
        roi.binning, roi.x, roi.y, roi.width, roi.height
    )
}

fn set_filename_attribute(attribute: &FilenameAttribute) -> String {
    let (tag, value) = match attribute {
        FilenameAttribute::Well(well) => ("Coordinate", well.clone()),
        FilenameAttribute::WellNumber(n) => ("WE", n.to_string()),
        FilenameAttribute::Subposition(n) => ("PO", n.to_string()),
        FilenameAttribute::Timepoint(n) => ("LO", n.to_string()),
        FilenameAttribute::Channel(n) => ("CO", n.to_string()),
    };
    format!(
        "SetImageFileNameAttribute(ImageFileNameAttribute.{}, {})",
        tag, value
    )
}

fn set_bright_field(settings: &ChannelSettings) -> String {
    format!(
        "SetBrightField({}, {}, {}, {}, {}, {})",
        settings.channel,
        settings.detection_filter,
        settings.intensity,
        settings.exposure_ms,
        AUTOFOCUS_OFFSET,
        settings.light_constant_on
    )
}

fn set_fluo_channel(mask: &ChannelMask, settings: &ChannelSettings) -> String {
    format!(
        "SetFluoChannel({}, \"{}\", {}, {}, {}, {}, {})",
        settings.channel,
        mask,
        settings.detection_filter,
        settings.intensity,
        settings.exposure_ms,
        AUTOFOCUS_OFFSET,
        settings.light_constant_on
    )
}

fn acquire(z_stack: &ZStack, save_directory: Option<&Path>) -> String {
    match save_directory {
        Some(dir) => format!(
            "Acquire({},{:.1},{:.1},{})",
            z_stack.slices,
            z_stack.step_um,
            z_stack.center_um,
            dir.display()
        ),
        None => format!(
            "Acquire({},{:.1},{:.1})",
            z_stack.slices, z_stack.step_um, z_stack.center_um
        ),
    }
}

fn software_autofocus(z_stack: &ZStack) -> String {
    format!(
        "SoftwareAutofocus({:.1}, {}, {:.1})",
        z_stack.center_um, z_stack.slices, z_stack.step_um
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(command: Command) -> String {
        create_command(&command).unwrap()
    }

    #[test]
    fn test_moves() {
        assert_eq!(
            render(Command::go_to_xy(12.345, 23.456).unwrap()),
            "GotoXY(12.345,23.456)"
        );
        assert_eq!(render(Command::go_to_z(20.1).unwrap()), "GotoZ(20.1)");
        assert_eq!(
            render(Command::go_to_xyz(50.0, 40.5, 100.0).unwrap()),
            "GotoXYZ(50.000,40.500,100.0)"
        );
    }

    #[test]
    fn test_light_channels() {
        let settings = ChannelSettings::new(2, 3, 80, 100, true).unwrap();
        assert_eq!(
            render(Command::SetBrightField(settings)),
            "SetBrightField(2, 3, 80, 100, 0, true)"
        );

        let mask: ChannelMask = "010001".parse().unwrap();
        assert_eq!(
            render(Command::SetFluoChannel { mask, settings }),
            "SetFluoChannel(2, \"010001\", 3, 80, 100, 0, true)"
        );
        assert_eq!(
            render(Command::BrightFieldOff),
            "SetBrightField(1, 1, 0, 0, 0, false)"
        );
        assert_eq!(
            render(Command::FluoChannelOff),
            "SetFluoChannel(1, \"111111\", 1, 0, 0, 0, false)"
        );
    }

    #[test]
    fn test_filename_attributes() {
        assert_eq!(
            render(Command::SetFilenameAttribute(
                FilenameAttribute::well("B002", '-').unwrap()
            )),
            "SetImageFileNameAttribute(ImageFileNameAttribute.Coordinate, -B002)"
        );
        assert_eq!(
            render(Command::SetFilenameAttribute(
                FilenameAttribute::timepoint(12).unwrap()
            )),
            "SetImageFileNameAttribute(ImageFileNameAttribute.LO, 12)"
        );
    }

    #[test]
    fn test_acquire_and_autofocus() {
        let z_stack = ZStack::new(100.0, 5, 2.5).unwrap();
        assert_eq!(
            render(Command::Acquire {
                z_stack,
                save_directory: None
            }),
            "Acquire(5,2.5,100.0)"
        );
        assert_eq!(
            render(Command::Acquire {
                z_stack,
                save_directory: Some("/data/run1".into())
            }),
            "Acquire(5,2.5,100.0,/data/run1)"
        );
        assert_eq!(
            render(Command::SoftwareAutofocus(z_stack)),
            "SoftwareAutofocus(100.0, 5, 2.5)"
        );
    }

    #[test]
    fn test_mode_and_temperature() {
        assert_eq!(render(Command::SetScriptMode(Mode::Script)), "SetScriptMode(1)");
        assert_eq!(render(Command::SetScriptMode(Mode::Live)), "SetScriptMode(0)");
        assert_eq!(
            render(Command::GetTemperature(TemperatureProbe::Sample)),
            "GetSampleTemperature(TemperatureUnit.Celsius)"
        );
        assert_eq!(
            render(Command::set_target_temperature(30.0).unwrap()),
            "SetTargetTemperature(30.0, TemperatureUnit.Celsius)"
        );
        assert_eq!(
            render(Command::SetCamera(CameraRoi::full_frame())),
            "SetCamera(1,0,0,2048,2048)"
        );
    }

    #[test]
    fn test_unsupported_commands() {
        assert!(create_command(&Command::GetVersion).is_none());
        assert!(create_command(&Command::StartScript).is_none());
    }
}
