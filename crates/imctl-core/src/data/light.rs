//! Light sources
//!
//! The instrument has one brightfield source and six fluorescence LEDs. The
//! LEDs are addressed with a 6-character mask of `0`/`1`, first character
//! for the first LED (e.g. `"010001"` lights the 2nd and 6th LEDs).

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fluorescence LEDs
pub const FLUORESCENCE_LED_COUNT: usize = 6;

/// Selection of fluorescence LEDs, never empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelMask([bool; FLUORESCENCE_LED_COUNT]);

impl ChannelMask {
    /// Mask with every LED selected
    pub const fn all() -> Self {
        Self([true; FLUORESCENCE_LED_COUNT])
    }

    /// Build a mask from per-LED flags; at least one must be set
    pub fn new(leds: [bool; FLUORESCENCE_LED_COUNT]) -> Result<Self, ValidationError> {
        if !leds.iter().any(|on| *on) {
            return Err(ValidationError::invalid(
                "light source",
                "at least one fluorescence light source must be selected",
            ));
        }
        Ok(Self(leds))
    }

    /// Per-LED flags
    pub fn leds(&self) -> [bool; FLUORESCENCE_LED_COUNT] {
        self.0
    }

    /// Number of selected LEDs
    pub fn count(&self) -> usize {
        self.0.iter().filter(|on| **on).count()
    }
}

impl FromStr for ChannelMask {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ValidationError::invalid(
                "light source",
                format!(
                    "'{}' must be 'brightfield'/'bf' or a 6-character string of 0 and 1, ex: '010000'",
                    s
                ),
            )
        };

        if s.len() != FLUORESCENCE_LED_COUNT {
            return Err(invalid());
        }

        let mut leds = [false; FLUORESCENCE_LED_COUNT];
        for (slot, c) in leds.iter_mut().zip(s.chars()) {
            *slot = match c {
                '0' => false,
                '1' => true,
                _ => return Err(invalid()),
            };
        }

        Self::new(leds)
    }
}

impl fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for on in self.0 {
            f.write_str(if on { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl TryFrom<String> for ChannelMask {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelMask> for String {
    fn from(mask: ChannelMask) -> Self {
        mask.to_string()
    }
}

/// Light source used for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightSource {
    /// Transmitted brightfield illumination
    Brightfield,
    /// One or more fluorescence LEDs
    Fluorescence(ChannelMask),
}

impl LightSource {
    /// Check whether this is the brightfield source
    pub fn is_brightfield(&self) -> bool {
        matches!(self, Self::Brightfield)
    }
}

impl FromStr for LightSource {
    type Err = ValidationError;

    /// Parse `brightfield`/`bf` (case-insensitive) or a 6-character LED mask
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brightfield" | "bf" => Ok(Self::Brightfield),
            _ => s.parse().map(Self::Fluorescence),
        }
    }
}

impl fmt::Display for LightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brightfield => write!(f, "brightfield"),
            Self::Fluorescence(mask) => write!(f, "{}", mask),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brightfield_case_insensitive() {
        assert_eq!("BF".parse::<LightSource>().unwrap(), LightSource::Brightfield);
        assert_eq!(
            "BrightField".parse::<LightSource>().unwrap(),
            LightSource::Brightfield
        );
    }

    #[test]
    fn test_parse_mask() {
        let source: LightSource = "010001".parse().unwrap();
        match source {
            LightSource::Fluorescence(mask) => {
                assert_eq!(mask.leds(), [false, true, false, false, false, true]);
                assert_eq!(mask.count(), 2);
                assert_eq!(mask.to_string(), "010001");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reject_all_zero_mask() {
        assert!("000000".parse::<ChannelMask>().is_err());
    }

    #[test]
    fn test_reject_bad_masks() {
        assert!("01000".parse::<ChannelMask>().is_err());
        assert!("0100001".parse::<ChannelMask>().is_err());
        assert!("012000".parse::<ChannelMask>().is_err());
        assert!("dapi".parse::<LightSource>().is_err());
    }

    #[test]
    fn test_all_mask() {
        assert_eq!(ChannelMask::all().to_string(), "111111");
    }
}
