//! Instrument commands
//!
//! A [`Command`] is the dialect-independent description of one request to
//! the instrument. Commands that carry arguments are built through the
//! validating constructors on [`Command`] and the argument types of this
//! module, so an out-of-contract value is rejected before anything is
//! written to the socket. Dialects turn a command into its wire payload.
//!
//! Units: X/Y in millimeters, Z in micrometers, temperatures in degrees
//! Celsius, exposure in milliseconds, intensity in percent.

use crate::response::ValueKind;
use imctl_core::{ChannelMask, Error, LightSource, Mode, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Allowed X range (mm)
pub const X_RANGE_MM: RangeInclusive<f64> = 10.0..=119.0;
/// Allowed Y range (mm)
pub const Y_RANGE_MM: RangeInclusive<f64> = 7.0..=82.0;
/// Allowed Z range (µm)
pub const Z_RANGE_UM: RangeInclusive<f64> = 0.0..=23000.0;
/// Allowed target temperature (°C)
pub const TEMPERATURE_RANGE_C: RangeInclusive<f64> = 18.0..=34.0;
/// Camera sensor side in pixels
pub const SENSOR_SIZE_PX: u32 = 2048;
/// Objective indices available on the turret
pub const OBJECTIVE_RANGE: RangeInclusive<u8> = 1..=4;
/// Detection filter positions
pub const FILTER_RANGE: RangeInclusive<u8> = 1..=4;
/// Camera binning factors
pub const BINNING_FACTORS: [u8; 3] = [1, 2, 4];
/// Channel numbers accepted for the CO filename tag
pub const CHANNEL_NUMBER_RANGE: RangeInclusive<u32> = 1..=9;
/// Largest subposition number (PO tag)
pub const MAX_SUBPOSITION: u32 = 99;
/// Largest timepoint number (LO tag)
pub const MAX_TIMEPOINT: u32 = 999;
/// Largest light intensity (%)
pub const MAX_INTENSITY: u8 = 100;

/// Leading character placed before a well identifier by default
pub const DEFAULT_WELL_LEADING_CHAR: char = '-';

fn check_range(parameter: &str, value: f64, range: &RangeInclusive<f64>) -> Result<f64> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::out_of_range(parameter, *range.start(), *range.end(), value).into())
    }
}

fn check_int_range<T>(parameter: &str, value: T, range: &RangeInclusive<T>) -> Result<T>
where
    T: PartialOrd + Copy + Into<f64>,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::out_of_range(
            parameter,
            (*range.start()).into(),
            (*range.end()).into(),
            value.into(),
        )
        .into())
    }
}

fn check_non_negative(parameter: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::invalid(
            parameter,
            format!("must be a positive number or 0, got {}", value),
        )
        .into())
    }
}

/// Temperature sensor to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureProbe {
    /// Air temperature around the instrument
    Ambient,
    /// Temperature at the sample holder
    Sample,
    /// Regulation setpoint
    Target,
}

/// Plate axis for well counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateAxis {
    /// Number of wells along X
    Columns,
    /// Number of wells along Y
    Rows,
}

/// Camera region of interest and binning
///
/// Only built through [`CameraRoi::new`], also when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCameraRoi")]
pub struct CameraRoi {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) binning: u8,
}

#[derive(Deserialize)]
struct RawCameraRoi {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    binning: u8,
}

impl TryFrom<RawCameraRoi> for CameraRoi {
    type Error = Error;

    fn try_from(raw: RawCameraRoi) -> Result<Self> {
        Self::new(raw.x, raw.y, raw.width, raw.height, raw.binning)
    }
}

impl CameraRoi {
    /// Validate a region of interest on the 2048 x 2048 sensor
    pub fn new(x: u32, y: u32, width: u32, height: u32, binning: u8) -> Result<Self> {
        if !BINNING_FACTORS.contains(&binning) {
            return Err(ValidationError::invalid(
                "binning",
                format!("must be one of 1, 2, 4, got {}", binning),
            )
            .into());
        }

        let sensor = 0..=SENSOR_SIZE_PX;
        for (parameter, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            check_int_range(parameter, value, &sensor)?;
        }
        if x + width > SENSOR_SIZE_PX || y + height > SENSOR_SIZE_PX {
            return Err(ValidationError::invalid(
                "camera region",
                format!("must fit on the {0} x {0} sensor", SENSOR_SIZE_PX),
            )
            .into());
        }

        Ok(Self {
            x,
            y,
            width,
            height,
            binning,
        })
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn binning(&self) -> u8 {
        self.binning
    }

    /// Full sensor without binning
    pub fn full_frame() -> Self {
        Self {
            x: 0,
            y: 0,
            width: SENSOR_SIZE_PX,
            height: SENSOR_SIZE_PX,
            binning: 1,
        }
    }
}

impl Default for CameraRoi {
    fn default() -> Self {
        Self::full_frame()
    }
}

/// Light channel parameters shared by brightfield and fluorescence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChannelSettings")]
pub struct ChannelSettings {
    /// Channel number, also used for the CO filename tag
    pub(crate) channel: u32,
    /// Detection filter position (1 to 4)
    pub(crate) detection_filter: u8,
    /// Light intensity in percent
    pub(crate) intensity: u8,
    /// Exposure time in milliseconds
    pub(crate) exposure_ms: u32,
    /// Keep the light on between exposures
    pub(crate) light_constant_on: bool,
}

#[derive(Deserialize)]
struct RawChannelSettings {
    channel: u32,
    detection_filter: u8,
    intensity: u8,
    exposure_ms: u32,
    light_constant_on: bool,
}

impl TryFrom<RawChannelSettings> for ChannelSettings {
    type Error = Error;

    fn try_from(raw: RawChannelSettings) -> Result<Self> {
        Self::new(
            raw.channel,
            raw.detection_filter,
            raw.intensity,
            raw.exposure_ms,
            raw.light_constant_on,
        )
    }
}

impl ChannelSettings {
    pub fn new(
        channel: u32,
        detection_filter: u8,
        intensity: u8,
        exposure_ms: u32,
        light_constant_on: bool,
    ) -> Result<Self> {
        if channel == 0 {
            return Err(
                ValidationError::invalid("channel", "must be a strictly positive integer").into(),
            );
        }
        check_int_range("detection filter", detection_filter, &FILTER_RANGE)?;
        check_int_range("intensity", intensity, &(0..=MAX_INTENSITY))?;

        Ok(Self {
            channel,
            detection_filter,
            intensity,
            exposure_ms,
            light_constant_on,
        })
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn detection_filter(&self) -> u8 {
        self.detection_filter
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn exposure_ms(&self) -> u32 {
        self.exposure_ms
    }

    pub fn light_constant_on(&self) -> bool {
        self.light_constant_on
    }
}

/// Z-stack definition for acquisitions and autofocus
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawZStack")]
pub struct ZStack {
    /// Center of the stack (µm)
    pub(crate) center_um: f64,
    /// Number of slices
    pub(crate) slices: u32,
    /// Distance between slices (µm)
    pub(crate) step_um: f64,
}

#[derive(Deserialize)]
struct RawZStack {
    center_um: f64,
    slices: u32,
    step_um: f64,
}

impl TryFrom<RawZStack> for ZStack {
    type Error = Error;

    fn try_from(raw: RawZStack) -> Result<Self> {
        Self::new(raw.center_um, raw.slices, raw.step_um)
    }
}

impl ZStack {
    pub fn new(center_um: f64, slices: u32, step_um: f64) -> Result<Self> {
        let center_um = check_non_negative("z-stack center", center_um)?;
        let step_um = check_non_negative("z-stack step", step_um)?;
        if slices == 0 {
            return Err(
                ValidationError::invalid("number of slices", "must be at least 1").into(),
            );
        }

        Ok(Self {
            center_um,
            slices,
            step_um,
        })
    }

    /// Single plane at the given Z
    pub fn single(center_um: f64) -> Result<Self> {
        Self::new(center_um, 1, 0.0)
    }

    pub fn center_um(&self) -> f64 {
        self.center_um
    }

    pub fn slices(&self) -> u32 {
        self.slices
    }

    pub fn step_um(&self) -> f64 {
        self.step_um
    }
}

/// Everything the session needs for one acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionRequest {
    pub light_source: LightSource,
    pub channel: ChannelSettings,
    pub z_stack: ZStack,
    /// Directory the images are saved to, instrument default when `None`
    pub save_directory: Option<PathBuf>,
}

/// Image filename attribute set before an acquisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilenameAttribute {
    /// Well identifier with its leading character (`Coordinate` tag)
    Well(String),
    /// Well number (`WE` tag)
    WellNumber(u32),
    /// Subposition within the well (`PO` tag)
    Subposition(u32),
    /// Timepoint (`LO` tag)
    Timepoint(u32),
    /// Channel number (`CO` tag)
    Channel(u32),
}

impl FilenameAttribute {
    /// Well identifier such as `A001`: one letter then three digits
    pub fn well(id: &str, leading_char: char) -> Result<Self> {
        let mut chars = id.chars();
        let valid = id.chars().count() == 4
            && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_digit());
        if !valid {
            return Err(ValidationError::invalid(
                "well id",
                format!(
                    "'{}' must be 4 characters long, a letter then 3 digits, ex: 'A001'",
                    id
                ),
            )
            .into());
        }

        if !leading_char.is_ascii_graphic() || matches!(leading_char, ',' | '(' | ')' | '"') {
            return Err(ValidationError::invalid(
                "leading character",
                format!("'{}' cannot be used before a well id", leading_char),
            )
            .into());
        }

        Ok(Self::Well(format!("{}{}", leading_char, id)))
    }

    pub fn well_number(number: u32) -> Result<Self> {
        if number == 0 {
            return Err(
                ValidationError::invalid("well number", "must be a strictly positive integer")
                    .into(),
            );
        }
        Ok(Self::WellNumber(number))
    }

    pub fn subposition(number: u32) -> Result<Self> {
        check_int_range("subposition", number, &(1..=MAX_SUBPOSITION)).map(Self::Subposition)
    }

    pub fn timepoint(number: u32) -> Result<Self> {
        check_int_range("timepoint", number, &(1..=MAX_TIMEPOINT)).map(Self::Timepoint)
    }

    pub fn channel(number: u32) -> Result<Self> {
        check_int_range("channel number", number, &CHANNEL_NUMBER_RANGE).map(Self::Channel)
    }
}

/// Script file checked against a dialect's accepted extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    path: PathBuf,
}

impl ScriptFile {
    /// Check extension, existence and file type of a script path
    pub fn new(path: impl Into<PathBuf>, accepted_extensions: &[&str]) -> Result<Self> {
        let path = path.into();

        let extension_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                accepted_extensions
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            });
        if !extension_ok {
            let accepted: Vec<String> = accepted_extensions
                .iter()
                .map(|e| format!(".{}", e))
                .collect();
            return Err(ValidationError::invalid(
                "script path",
                format!(
                    "'{}' must have one of the extensions {}",
                    path.display(),
                    accepted.join(", ")
                ),
            )
            .into());
        }

        if !path.exists() {
            return Err(Error::NotFound { path });
        }

        if !path.is_file() {
            return Err(ValidationError::invalid(
                "script path",
                format!("'{}' is a directory, expected a script file", path.display()),
            )
            .into());
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One request to the instrument
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Queries
    GetVersion,
    GetStatus,
    LiveModeActive,
    GetPositionX,
    GetPositionY,
    GetPositionZ,
    GetObjective,
    GetLightChannel,
    GetWellCoordinate,
    GetZStackCenter,
    IsLidClosed,
    IsLidOpened,
    IsTemperatureRegulated,
    GetTemperature(TemperatureProbe),
    GetWellCount(PlateAxis),
    SoftwareAutofocus(ZStack),

    // Actions
    OpenLid,
    CloseLid,
    GoToXy { x: f64, y: f64 },
    GoToZ { z: f64 },
    GoToXyz { x: f64, y: f64, z: f64 },
    SetTemperatureRegulation(bool),
    SetTargetTemperature(f64),
    SetCamera(CameraRoi),
    SetObjective(u8),
    SetFilenameAttribute(FilenameAttribute),
    SetBrightField(ChannelSettings),
    SetFluoChannel {
        mask: ChannelMask,
        settings: ChannelSettings,
    },
    BrightFieldOff,
    FluoChannelOff,
    Acquire {
        z_stack: ZStack,
        save_directory: Option<PathBuf>,
    },
    SetScriptMode(Mode),
    RunScript(ScriptFile),
    LoadScript(ScriptFile),
    StartScript,
    StopScript,
}

impl Command {
    /// Move the objective in X/Y (mm)
    pub fn go_to_xy(x: f64, y: f64) -> Result<Self> {
        Ok(Self::GoToXy {
            x: check_range("x", x, &X_RANGE_MM)?,
            y: check_range("y", y, &Y_RANGE_MM)?,
        })
    }

    /// Move the objective in Z (µm)
    pub fn go_to_z(z: f64) -> Result<Self> {
        Ok(Self::GoToZ {
            z: check_range("z", z, &Z_RANGE_UM)?,
        })
    }

    /// Move the objective in X/Y (mm) and Z (µm)
    pub fn go_to_xyz(x: f64, y: f64, z: f64) -> Result<Self> {
        Ok(Self::GoToXyz {
            x: check_range("x", x, &X_RANGE_MM)?,
            y: check_range("y", y, &Y_RANGE_MM)?,
            z: check_range("z", z, &Z_RANGE_UM)?,
        })
    }

    pub fn set_target_temperature(celsius: f64) -> Result<Self> {
        check_range("target temperature", celsius, &TEMPERATURE_RANGE_C)
            .map(Self::SetTargetTemperature)
    }

    pub fn set_objective(index: u8) -> Result<Self> {
        check_int_range("objective index", index, &OBJECTIVE_RANGE).map(Self::SetObjective)
    }

    /// Switch on the given light source with the channel settings
    pub fn set_light_source(source: LightSource, settings: ChannelSettings) -> Self {
        match source {
            LightSource::Brightfield => Self::SetBrightField(settings),
            LightSource::Fluorescence(mask) => Self::SetFluoChannel { mask, settings },
        }
    }

    /// Switch off the given light source
    pub fn light_source_off(source: LightSource) -> Self {
        match source {
            LightSource::Brightfield => Self::BrightFieldOff,
            LightSource::Fluorescence(_) => Self::FluoChannelOff,
        }
    }

    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetVersion => "get_version",
            Self::GetStatus => "get_status",
            Self::LiveModeActive => "live_mode_active",
            Self::GetPositionX => "get_position_x",
            Self::GetPositionY => "get_position_y",
            Self::GetPositionZ => "get_position_z",
            Self::GetObjective => "get_objective",
            Self::GetLightChannel => "get_light_channel",
            Self::GetWellCoordinate => "get_well_coordinate",
            Self::GetZStackCenter => "get_z_stack_center",
            Self::IsLidClosed => "is_lid_closed",
            Self::IsLidOpened => "is_lid_opened",
            Self::IsTemperatureRegulated => "is_temperature_regulated",
            Self::GetTemperature(_) => "get_temperature",
            Self::GetWellCount(_) => "get_well_count",
            Self::SoftwareAutofocus(_) => "software_autofocus",
            Self::OpenLid => "open_lid",
            Self::CloseLid => "close_lid",
            Self::GoToXy { .. } => "go_to_xy",
            Self::GoToZ { .. } => "go_to_z",
            Self::GoToXyz { .. } => "go_to_xyz",
            Self::SetTemperatureRegulation(_) => "set_temperature_regulation",
            Self::SetTargetTemperature(_) => "set_target_temperature",
            Self::SetCamera(_) => "set_camera",
            Self::SetObjective(_) => "set_objective",
            Self::SetFilenameAttribute(_) => "set_filename_attribute",
            Self::SetBrightField(_) => "set_bright_field",
            Self::SetFluoChannel { .. } => "set_fluo_channel",
            Self::BrightFieldOff => "bright_field_off",
            Self::FluoChannelOff => "fluo_channel_off",
            Self::Acquire { .. } => "acquire",
            Self::SetScriptMode(_) => "set_script_mode",
            Self::RunScript(_) => "run_script",
            Self::LoadScript(_) => "load_script",
            Self::StartScript => "start_script",
            Self::StopScript => "stop_script",
        }
    }

    /// Kind of the feedback value, `None` for commands answered by an acknowledgment
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            Self::GetVersion | Self::GetStatus | Self::GetWellCoordinate => Some(ValueKind::Str),
            Self::LiveModeActive
            | Self::IsLidClosed
            | Self::IsLidOpened
            | Self::IsTemperatureRegulated => Some(ValueKind::Bool),
            Self::GetPositionX
            | Self::GetPositionY
            | Self::GetPositionZ
            | Self::GetZStackCenter
            | Self::GetTemperature(_)
            | Self::SoftwareAutofocus(_) => Some(ValueKind::Float),
            Self::GetObjective | Self::GetLightChannel | Self::GetWellCount(_) => {
                Some(ValueKind::Int)
            }
            _ => None,
        }
    }

    /// Check if the command expects a feedback value
    pub fn is_query(&self) -> bool {
        self.value_kind().is_some()
    }
}
