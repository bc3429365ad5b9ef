//! Typed property values

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Declared type of an extracted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Raw captured text
    String,
    /// Boolean (`true/false`, `yes/no`, `1/0`)
    Bool,
}

impl ValueType {
    /// Convert captured text to a value of this type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedField`] if the capture cannot be converted.
    /// Floats must be finite: `nan` and `inf` have no JSON form.
    pub fn convert(self, field: &str, raw_capture: &str) -> Result<Value> {
        let malformed = || Error::MalformedField {
            field: field.to_string(),
            raw_capture: raw_capture.to_string(),
        };
        let trimmed = raw_capture.trim();
        match self {
            Self::Int => trimmed.parse().map(Value::Int).map_err(|_| malformed()),
            Self::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Float)
                .ok_or_else(malformed),
            Self::String => Ok(Value::Str(raw_capture.to_string())),
            Self::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "0" => Ok(Value::Bool(false)),
                _ => Err(malformed()),
            },
        }
    }
}

/// A single property value.
///
/// Serialized untagged, so records read as plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    Str(String),
}

impl Value {
    /// Numeric view of the value; `None` for strings and booleans.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }

    /// Integer view of the value; `None` unless this is an `Int`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether the value counts as "present and non-empty" for guarded derivations.
    ///
    /// Zero, `false`, NaN and the empty string are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0 && !v.is_nan(),
            Self::Str(v) => !v.is_empty(),
        }
    }

    /// The type this value carries.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::String,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_int() {
        assert_eq!(ValueType::Int.convert("n", "48").unwrap(), Value::Int(48));
        assert_eq!(ValueType::Int.convert("n", " 7 ").unwrap(), Value::Int(7));
    }

    #[test]
    fn test_convert_float() {
        assert_eq!(
            ValueType::Float.convert("t", "0.25").unwrap(),
            Value::Float(0.25)
        );
    }

    #[test]
    fn test_convert_non_finite_float_rejected() {
        for capture in ["nan", "NaN", "inf", "-inf", "infinity"] {
            let err = ValueType::Float.convert("t", capture).unwrap_err();
            assert!(
                matches!(err, Error::MalformedField { ref raw_capture, .. } if raw_capture == capture),
                "{capture} accepted"
            );
        }
    }

    #[test]
    fn test_convert_malformed_int() {
        let err = ValueType::Int.convert("n", "12a").unwrap_err();
        match err {
            Error::MalformedField { field, raw_capture } => {
                assert_eq!(field, "n");
                assert_eq!(raw_capture, "12a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_convert_bool() {
        assert_eq!(ValueType::Bool.convert("b", "Yes").unwrap(), Value::Bool(true));
        assert_eq!(ValueType::Bool.convert("b", "0").unwrap(), Value::Bool(false));
        assert!(ValueType::Bool.convert("b", "maybe").is_err());
    }

    #[test]
    fn test_string_passthrough_keeps_whitespace() {
        assert_eq!(
            ValueType::String.convert("s", " a b ").unwrap(),
            Value::Str(" a b ".to_string())
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(3).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
    }

    #[test]
    fn test_untagged_serialization() {
        assert_eq!(serde_json::to_string(&Value::Int(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Value::Float(3.0)).unwrap(), "3.0");
        let back: Value = serde_json::from_str("3.0").unwrap();
        assert_eq!(back, Value::Float(3.0));
        let back: Value = serde_json::from_str("3").unwrap();
        assert_eq!(back, Value::Int(3));
    }
}
