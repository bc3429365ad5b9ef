//! Experiment batches: processing, merging and pairing
//!
//! ## Data Flow
//!
//! ```text
//! RunOutput (N) ──process──> ExperimentBatch ──merge──> ExperimentBatch
//!                                  │                          │
//!                                  └──────────pair────────────┘
//!                                              │
//!                                  (PropertyRecord, PropertyRecord)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use runlab::experiment::{merge, pair, AlgorithmPairing, BatchEntry, ExperimentBatch, MergeMode};
//! use runlab::properties::PropertyRecord;
//!
//! let old = ExperimentBatch::from_entries(
//!     "old",
//!     vec![BatchEntry::parsed("r1-ms", "gripper:p01", PropertyRecord::new().with("cost", 11_i64))],
//! )?;
//! let new = ExperimentBatch::from_entries(
//!     "new",
//!     vec![BatchEntry::parsed("r2-ms", "gripper:p01", PropertyRecord::new().with("cost", 9_i64))],
//! )?;
//!
//! let merged = merge(&[old.clone(), new.clone()], MergeMode::Strict)?;
//! assert_eq!(merged.len(), 2);
//!
//! let rows = pair(&old, &new, &AlgorithmPairing::revisions("r1", "r2", ["ms"]))?;
//! assert_eq!(rows[0].1.get_i64("cost"), Some(9));
//! # Ok::<(), runlab::Error>(())
//! ```

mod batch;
mod definition;
mod merge;
mod outcome;
mod pairing;
mod process;

pub use batch::{BatchEntry, ExperimentBatch};
pub use definition::{ComparisonSpec, ExperimentDefinition, ExperimentDefinitionBuilder};
pub use merge::{merge, MergeMode};
pub use outcome::{RunOutcome, RunStatus};
pub use pairing::{pair, pair_tasks, AlgorithmPairing, PairedRow, PairedTasks, UnmatchedTask};
pub use process::{
    process_output, process_outputs, ExitCodePolicy, ProcessingReport, ReportLine, RunOutput,
};
