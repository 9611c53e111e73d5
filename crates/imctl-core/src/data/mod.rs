//! Data models for the instrument session
//!
//! This module provides:
//! - The instrument mode (live/script)
//! - Objective position tracking, with partial values for unconfirmed axes
//! - Image filename attributes fed to the instrument before acquisitions
//! - The aggregated session state
//! - Light source selection
//! - Wire dialect selection

pub mod dialect;
pub mod light;

pub use dialect::DialectKind;
pub use light::{ChannelMask, LightSource, FLUORESCENCE_LED_COUNT};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instrument operating mode
///
/// Exactly one mode holds at any time. Interactive commands apply
/// immediately in live mode; camera-synchronized acquisitions require
/// script mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Interactive mode
    Live,
    /// Scripted acquisition mode
    Script,
}

impl Mode {
    /// Map the instrument's "live mode active" flag to a mode
    pub fn from_live_flag(live: bool) -> Self {
        if live {
            Self::Live
        } else {
            Self::Script
        }
    }

    /// Check if this is live mode
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Script => write!(f, "script"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "script" => Ok(Self::Script),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

/// Objective position: X/Y in millimeters, Z in micrometers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position (mm)
    pub x: f64,
    /// Y-axis position (mm)
    pub y: f64,
    /// Z-axis position (µm)
    pub z: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X={:.3}mm Y={:.3}mm Z={:.1}µm", self.x, self.y, self.z)
    }
}

/// Position with per-axis knowledge
///
/// An axis is `None` until a round trip has confirmed its value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialPosition {
    /// X-axis position (mm)
    pub x: Option<f64>,
    /// Y-axis position (mm)
    pub y: Option<f64>,
    /// Z-axis position (µm)
    pub z: Option<f64>,
}

impl PartialPosition {
    /// Convert to a full position when every axis is known
    pub fn to_position(&self) -> Option<Position> {
        Some(Position::new(self.x?, self.y?, self.z?))
    }

    /// Check if no axis is known
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }
}

impl From<Position> for PartialPosition {
    fn from(position: Position) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            z: Some(position.z),
        }
    }
}

/// Attributes the instrument uses to name the next image files
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageFilenameAttributes {
    /// Well identifier including its leading character (ex: `-A001`)
    pub well: Option<String>,
    /// Well number (WE tag)
    pub well_number: Option<u32>,
    /// Subposition within the well (PO tag)
    pub subposition: Option<u32>,
    /// Timepoint / loop iteration (LO tag)
    pub timepoint: Option<u32>,
    /// Channel index (CO tag)
    pub channel: Option<u32>,
}

/// State tracked for one instrument session
///
/// Values are only recorded after the instrument confirmed them, either by
/// answering a query or by acknowledging a command the session sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Current mode, `None` until queried or set
    pub mode: Option<Mode>,
    /// Selected objective (1 to 4)
    pub objective_index: Option<u8>,
    /// Light source switched on in live mode by this session
    pub active_light: Option<LightSource>,
    /// Last confirmed objective position
    pub position: PartialPosition,
    /// Filename attributes for the next acquisitions
    pub image_filename_attributes: ImageFilenameAttributes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_live_flag() {
        assert_eq!(Mode::from_live_flag(true), Mode::Live);
        assert_eq!(Mode::from_live_flag(false), Mode::Script);
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("LIVE".parse::<Mode>().unwrap(), Mode::Live);
        assert_eq!("script".parse::<Mode>().unwrap(), Mode::Script);
        assert!("settingOn".parse::<Mode>().is_err());
        assert_eq!(Mode::Script.to_string(), "script");
    }

    #[test]
    fn test_partial_position() {
        let mut partial = PartialPosition::default();
        assert!(partial.is_empty());
        assert_eq!(partial.to_position(), None);

        partial.x = Some(12.345);
        partial.y = Some(23.456);
        assert!(!partial.is_empty());
        assert_eq!(partial.to_position(), None);

        partial.z = Some(20.1);
        assert_eq!(
            partial.to_position(),
            Some(Position::new(12.345, 23.456, 20.1))
        );
    }

    #[test]
    fn test_position_display() {
        let pos = Position::new(12.3456, 7.0, 20.14);
        assert_eq!(pos.to_string(), "X=12.346mm Y=7.000mm Z=20.1µm");
    }
}
