//! Typed feedback values
//!
//! Queries return a text value inside the response frame. The command
//! decides which type the text is cast to.

use imctl_core::ProtocolError;
use serde::Serialize;
use std::fmt;

/// Type a query's feedback is cast to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// Integer flag, `0` or `1`
    Bool,
    /// Free text
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "boolean"),
            Self::Str => write!(f, "string"),
        }
    }
}

/// Feedback value returned by a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Kind of the value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::Str(_) => ValueKind::Str,
        }
    }

    pub fn into_i64(self) -> Result<i64, ProtocolError> {
        match self {
            Self::Int(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Int)),
        }
    }

    pub fn into_f64(self) -> Result<f64, ProtocolError> {
        match self {
            Self::Float(v) => Ok(v),
            Self::Int(v) => Ok(v as f64),
            other => Err(other.mismatch(ValueKind::Float)),
        }
    }

    pub fn into_bool(self) -> Result<bool, ProtocolError> {
        match self {
            Self::Bool(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Self::Str(v) => v,
            other => other.to_string(),
        }
    }

    fn mismatch(&self, kind: ValueKind) -> ProtocolError {
        ProtocolError::InvalidValue {
            raw: self.to_string(),
            kind: kind.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// Cast raw feedback text to the requested kind
///
/// Surrounding whitespace and NUL padding are ignored. Booleans are sent
/// by the instrument as the integers `0` and `1`.
pub fn cast_value(raw: &[u8], kind: ValueKind) -> Result<Value, ProtocolError> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');

    let invalid = || ProtocolError::InvalidValue {
        raw: text.to_string(),
        kind: kind.to_string(),
    };

    match kind {
        ValueKind::Int => text.parse().map(Value::Int).map_err(|_| invalid()),
        ValueKind::Float => text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Value::Float)
            .ok_or_else(invalid),
        ValueKind::Bool => match text.parse::<i64>() {
            Ok(0) => Ok(Value::Bool(false)),
            Ok(1) => Ok(Value::Bool(true)),
            _ => Err(invalid()),
        },
        ValueKind::Str => Ok(Value::Str(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_float() {
        assert_eq!(
            cast_value(b"12.345", ValueKind::Float).unwrap(),
            Value::Float(12.345)
        );
        assert!(cast_value(b"abc", ValueKind::Float).is_err());
        assert!(cast_value(b"NaN", ValueKind::Float).is_err());
    }

    #[test]
    fn test_cast_int_trims_padding() {
        assert_eq!(cast_value(b" 3\r\n", ValueKind::Int).unwrap(), Value::Int(3));
        assert_eq!(cast_value(b"96\0", ValueKind::Int).unwrap(), Value::Int(96));
        assert!(cast_value(b"3.5", ValueKind::Int).is_err());
    }

    #[test]
    fn test_cast_bool_from_integer_flag() {
        assert_eq!(cast_value(b"1", ValueKind::Bool).unwrap(), Value::Bool(true));
        assert_eq!(cast_value(b"0", ValueKind::Bool).unwrap(), Value::Bool(false));
        assert!(cast_value(b"2", ValueKind::Bool).is_err());
        assert!(cast_value(b"true", ValueKind::Bool).is_err());
    }

    #[test]
    fn test_cast_string() {
        assert_eq!(
            cast_value(b"B002", ValueKind::Str).unwrap(),
            Value::Str("B002".to_string())
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Int(4).into_f64().unwrap(), 4.0);
        assert!(Value::Str("x".into()).into_bool().is_err());
        assert_eq!(Value::Float(1.5).into_string(), "1.5");
    }
}
