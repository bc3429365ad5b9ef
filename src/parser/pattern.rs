//! Pattern Spec - a single named extraction rule

use regex::Regex;

use crate::properties::{Value, ValueType};
use crate::{Error, Result};

/// A named extraction rule: `(name, regex, required, value_type)`.
///
/// The regex must contain at least one capture group; the first group is
/// converted to `value_type` when the pattern matches.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    name: String,
    regex: Regex,
    required: bool,
    value_type: ValueType,
}

impl PatternSpec {
    /// Compile a new pattern spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the regex does not compile or has
    /// no capture group.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        required: bool,
        value_type: ValueType,
    ) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
            field: name.clone(),
            reason: e.to_string(),
        })?;
        if regex.captures_len() < 2 {
            return Err(Error::InvalidPattern {
                field: name,
                reason: format!("regex '{pattern}' has no capture group"),
            });
        }
        Ok(Self {
            name,
            regex,
            required,
            value_type,
        })
    }

    /// Field name written by this pattern.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of the regex.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether a missing match fails the run.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Declared value type.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Match against raw text, taking the first occurrence only.
    ///
    /// Returns `Ok(None)` for an optional pattern without a match.
    ///
    /// # Errors
    ///
    /// [`Error::MissingRequiredField`] for a required pattern without a match,
    /// [`Error::MalformedField`] if the capture does not convert.
    pub fn extract(&self, raw_text: &str) -> Result<Option<Value>> {
        let Some(captures) = self.regex.captures(raw_text) else {
            if self.required {
                return Err(Error::MissingRequiredField(self.name.clone()));
            }
            return Ok(None);
        };
        // Group 1 may not participate in an alternation; treat that as an empty capture.
        let raw_capture = captures.get(1).map_or("", |m| m.as_str());
        self.value_type.convert(&self.name, raw_capture).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_requires_capture_group() {
        let err = PatternSpec::new("order", r"Symmetry group order: \d+", false, ValueType::Int)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_pattern_invalid_regex() {
        let err = PatternSpec::new("bad", r"(\d+", false, ValueType::Int).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { field, .. } if field == "bad"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let spec = PatternSpec::new("cost", r"Plan cost: (\d+)", false, ValueType::Int).unwrap();
        let text = "Plan cost: 12\nrestart\nPlan cost: 9\n";
        assert_eq!(spec.extract(text).unwrap(), Some(Value::Int(12)));
    }

    #[test]
    fn test_optional_no_match_is_none() {
        let spec = PatternSpec::new("cost", r"Plan cost: (\d+)", false, ValueType::Int).unwrap();
        assert_eq!(spec.extract("nothing here").unwrap(), None);
    }

    #[test]
    fn test_required_no_match_errors() {
        let spec = PatternSpec::new("cost", r"Plan cost: (\d+)", true, ValueType::Int).unwrap();
        let err = spec.extract("nothing here").unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField(field) if field == "cost"));
    }
}
