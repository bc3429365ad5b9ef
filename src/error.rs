//! Error types for runlab
//!
//! Errors fall into three scopes:
//! - **Setup**: raised while building a parser or a run grid. Fatal to construction.
//! - **Per-run**: raised while parsing one run's output. Attached to that run's
//!   outcome, never propagated past the batch processor.
//! - **Batch**: raised by merge and pairing. Fatal to the whole operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a pairing a run name was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchSide {
    /// First batch of a pairing
    A,
    /// Second batch of a pairing
    B,
}

impl std::fmt::Display for BatchSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Runlab error types
#[derive(Error, Debug)]
pub enum Error {
    /// A pattern name was registered twice
    #[error("Duplicate field '{0}': pattern names must be unique within a parser")]
    DuplicateField(String),

    /// Two configurations share a nickname
    #[error("Duplicate config nick '{0}': runs of both configurations would be indistinguishable")]
    DuplicateConfigNick(String),

    /// A pattern regex did not compile or lacks a capture group
    #[error("Invalid pattern for field '{field}': {reason}")]
    InvalidPattern {
        /// Field the pattern was registered for
        field: String,
        /// Compiler message or structural problem
        reason: String,
    },

    /// A required pattern did not match the run output
    #[error("Missing required field '{0}': run output is corrupt or incomplete")]
    MissingRequiredField(String),

    /// A captured value could not be converted to the declared type
    #[error("Malformed field '{field}': cannot convert capture '{raw_capture}'")]
    MalformedField {
        /// Field name
        field: String,
        /// Text captured by the first regex group
        raw_capture: String,
    },

    /// A derived function rejected already-extracted data
    #[error("Derived function failed: {0}\nThis is a bug in the pattern set, not in the run output.")]
    DerivedFunction(String),

    /// A run name appears in more than one batch during a strict merge
    #[error("Conflicting run name '{0}': present in more than one batch (use overlay merge to let later batches win)")]
    ConflictingRunName(String),

    /// The same `(run_name, task_id)` was added to one batch twice
    #[error("Duplicate run '{run_name}' on task '{task_id}' within one batch")]
    DuplicateRun {
        /// Run name
        run_name: String,
        /// Task identity
        task_id: String,
    },

    /// A paired run name is absent from its batch
    #[error("Unknown run name '{name}' in batch {batch}")]
    UnknownRunName {
        /// Run name that was looked up
        name: String,
        /// Batch that was searched
        batch: BatchSide,
    },

    /// Structured solver configuration or experiment definition is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Short stable name of the error kind, used in processing reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateField(_) => "DuplicateFieldError",
            Self::DuplicateConfigNick(_) => "DuplicateConfigNickError",
            Self::InvalidPattern { .. } => "InvalidPatternError",
            Self::MissingRequiredField(_) => "MissingRequiredFieldError",
            Self::MalformedField { .. } => "MalformedFieldError",
            Self::DerivedFunction(_) => "DerivedFunctionError",
            Self::ConflictingRunName(_) => "ConflictingRunNameError",
            Self::DuplicateRun { .. } => "DuplicateRunError",
            Self::UnknownRunName { .. } => "UnknownRunNameError",
            Self::InvalidConfig(_) => "InvalidConfigError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::Other(_) => "Error",
        }
    }
}
