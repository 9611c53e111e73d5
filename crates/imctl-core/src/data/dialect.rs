//! Wire dialect selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire dialect spoken by the instrument's control software
///
/// Both dialects share the same length-prefixed framing and differ in how
/// a command is written inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// ASCII function-call text, ex: `GotoXY(12.345,23.456)`
    #[default]
    FunctionCall,
    /// Control-character delimited fields with a per-command token
    Delimiter,
}

impl DialectKind {
    /// Port the instrument listens on for this dialect by default
    pub fn default_port(&self) -> u16 {
        match self {
            Self::FunctionCall => 6200,
            Self::Delimiter => 6261,
        }
    }

    /// Name used in configuration files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FunctionCall => "function_call",
            Self::Delimiter => "delimiter",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "function_call" | "b" => Ok(Self::FunctionCall),
            "delimiter" | "a" => Ok(Self::Delimiter),
            _ => Err(format!(
                "Unknown dialect: {} (expected 'function_call' or 'delimiter')",
                s
            )),
        }
    }
}
