//! Run Outcome - what became of one run's output

use serde::{Deserialize, Serialize};

use crate::properties::PropertyRecord;
use crate::Error;

/// Coarse status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Output parsed into a record.
    Parsed,
    /// Output existed but could not be turned into a record.
    Unparsed,
    /// No output at all (canceled, timed out, never started).
    NoResult,
}

/// Outcome of processing one run.
///
/// `NoResult` and a `Parsed` record with absent optional fields are
/// different things: the former never reached the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Output parsed into a record.
    Parsed {
        /// Extracted and derived fields
        properties: PropertyRecord,
    },
    /// Parsing failed for this run.
    Unparsed {
        /// Error kind, e.g. `MissingRequiredFieldError`
        kind: String,
        /// Human-readable error message
        message: String,
    },
    /// The run produced no output.
    NoResult {
        /// Why there is no output
        reason: String,
    },
}

impl RunOutcome {
    /// Outcome for a parse error.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        Self::Unparsed {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    /// Outcome for a run without output.
    #[must_use]
    pub fn no_result(reason: impl Into<String>) -> Self {
        Self::NoResult {
            reason: reason.into(),
        }
    }

    /// Coarse status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        match self {
            Self::Parsed { .. } => RunStatus::Parsed,
            Self::Unparsed { .. } => RunStatus::Unparsed,
            Self::NoResult { .. } => RunStatus::NoResult,
        }
    }

    /// The parsed record, if any.
    #[must_use]
    pub const fn properties(&self) -> Option<&PropertyRecord> {
        match self {
            Self::Parsed { properties } => Some(properties),
            _ => None,
        }
    }
}

impl From<crate::Result<PropertyRecord>> for RunOutcome {
    fn from(result: crate::Result<PropertyRecord>) -> Self {
        match result {
            Ok(properties) => Self::Parsed { properties },
            Err(error) => Self::from_error(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_error() {
        let outcome = RunOutcome::from_error(&Error::MissingRequiredField("cost".into()));
        assert_eq!(outcome.status(), RunStatus::Unparsed);
        match outcome {
            RunOutcome::Unparsed { kind, message } => {
                assert_eq!(kind, "MissingRequiredFieldError");
                assert!(message.contains("cost"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_no_result_has_no_properties() {
        let outcome = RunOutcome::no_result("timeout");
        assert_eq!(outcome.status(), RunStatus::NoResult);
        assert!(outcome.properties().is_none());
    }

    #[test]
    fn test_outcome_json_tagged_by_status() {
        let outcome = RunOutcome::Parsed {
            properties: PropertyRecord::new().with("cost", 3_i64),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"status": "parsed", "properties": {"cost": 3}}));
    }
}
