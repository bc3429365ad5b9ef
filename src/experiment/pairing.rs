//! Explicit cross-batch alignment of run names

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ExperimentBatch;
use crate::error::BatchSide;
use crate::grid::run_name;
use crate::properties::PropertyRecord;
use crate::{Error, Result};

/// Declared `(name_in_a, name_in_b)` pairs. Never inferred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgorithmPairing {
    pairs: Vec<(String, String)>,
}

impl AlgorithmPairing {
    /// Create an empty pairing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair.
    #[must_use]
    pub fn with(mut self, name_a: impl Into<String>, name_b: impl Into<String>) -> Self {
        self.pairs.push((name_a.into(), name_b.into()));
        self
    }

    /// Pair `{old}-{nick}` with `{new}-{nick}` for every nick.
    #[must_use]
    pub fn revisions<'a>(
        old_revision: &str,
        new_revision: &str,
        nicks: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            pairs: nicks
                .into_iter()
                .map(|nick| (run_name(old_revision, nick), run_name(new_revision, nick)))
                .collect(),
        }
    }

    /// Declared pairs in order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if no pairs are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for AlgorithmPairing {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Both records of one pair on one task.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRow {
    /// Run name in batch A
    pub name_a: String,
    /// Run name in batch B
    pub name_b: String,
    /// Task identity
    pub task_id: String,
    /// Record from batch A
    pub a: PropertyRecord,
    /// Record from batch B
    pub b: PropertyRecord,
}

/// A task of a pair without a parsed record on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedTask {
    /// Run name in batch A
    pub name_a: String,
    /// Run name in batch B
    pub name_b: String,
    /// Task identity
    pub task_id: String,
    /// Sides lacking a parsed record
    pub missing: Vec<BatchSide>,
}

/// Result of [`pair_tasks`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairedTasks {
    /// Fully matched rows, in declared pair order then task order
    pub rows: Vec<PairedRow>,
    /// Tasks lacking a parsed record on at least one side
    pub unmatched: Vec<UnmatchedTask>,
}

fn check_present(batch: &ExperimentBatch, name: &str, side: BatchSide) -> Result<()> {
    if batch.contains_run(name) {
        Ok(())
    } else {
        Err(Error::UnknownRunName {
            name: name.to_string(),
            batch: side,
        })
    }
}

/// Align two batches task by task.
///
/// Every declared name is checked before any row is produced.
///
/// # Errors
///
/// [`Error::UnknownRunName`] if a declared name is absent from its batch.
pub fn pair_tasks(
    batch_a: &ExperimentBatch,
    batch_b: &ExperimentBatch,
    pairing: &AlgorithmPairing,
) -> Result<PairedTasks> {
    for (name_a, name_b) in pairing.pairs() {
        check_present(batch_a, name_a, BatchSide::A)?;
        check_present(batch_b, name_b, BatchSide::B)?;
    }

    let mut paired = PairedTasks::default();
    for (name_a, name_b) in pairing.pairs() {
        let tasks: BTreeSet<&str> = batch_a
            .runs(name_a)
            .chain(batch_b.runs(name_b))
            .map(|e| e.key.task_id.as_str())
            .collect();
        for task_id in tasks {
            let a = batch_a.record(name_a, task_id);
            let b = batch_b.record(name_b, task_id);
            if let (Some(a), Some(b)) = (a, b) {
                paired.rows.push(PairedRow {
                    name_a: name_a.clone(),
                    name_b: name_b.clone(),
                    task_id: task_id.to_string(),
                    a: a.clone(),
                    b: b.clone(),
                });
            } else {
                let mut missing = Vec::new();
                if a.is_none() {
                    missing.push(BatchSide::A);
                }
                if b.is_none() {
                    missing.push(BatchSide::B);
                }
                paired.unmatched.push(UnmatchedTask {
                    name_a: name_a.clone(),
                    name_b: name_b.clone(),
                    task_id: task_id.to_string(),
                    missing,
                });
            }
        }
    }
    Ok(paired)
}

/// Record pairs in declared pair order.
///
/// Tasks without a parsed record on both sides are left out of the result
/// and logged; use [`pair_tasks`] to inspect them.
///
/// # Errors
///
/// [`Error::UnknownRunName`] if a declared name is absent from its batch.
pub fn pair(
    batch_a: &ExperimentBatch,
    batch_b: &ExperimentBatch,
    pairing: &AlgorithmPairing,
) -> Result<Vec<(PropertyRecord, PropertyRecord)>> {
    let paired = pair_tasks(batch_a, batch_b, pairing)?;
    for task in &paired.unmatched {
        tracing::warn!(
            name_a = %task.name_a,
            name_b = %task.name_b,
            task = %task.task_id,
            missing = ?task.missing,
            "task has no parsed record on both sides"
        );
    }
    Ok(paired.rows.into_iter().map(|row| (row.a, row.b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{BatchEntry, RunOutcome};
    use crate::grid::RunKey;

    fn record(cost: i64) -> PropertyRecord {
        PropertyRecord::new().with("cost", cost)
    }

    fn batches() -> (ExperimentBatch, ExperimentBatch) {
        let a = ExperimentBatch::from_entries(
            "old",
            vec![
                BatchEntry::parsed("old-x", "t1", record(1)),
                BatchEntry::parsed("old-y", "t1", record(2)),
            ],
        )
        .unwrap();
        let b = ExperimentBatch::from_entries(
            "new",
            vec![
                BatchEntry::parsed("new-x", "t1", record(10)),
                BatchEntry::parsed("new-y", "t1", record(20)),
                BatchEntry::new(
                    RunKey::new("new-y", "t2"),
                    Some(23),
                    RunOutcome::no_result("timeout"),
                ),
            ],
        )
        .unwrap();
        (a, b)
    }

    #[test]
    fn test_pair_declared_order() {
        let (a, b) = batches();
        let pairing = AlgorithmPairing::revisions("old", "new", ["y", "x"]);
        let rows = pair(&a, &b, &pairing).unwrap();
        assert_eq!(rows, vec![(record(2), record(20)), (record(1), record(10))]);
    }

    #[test]
    fn test_pair_unknown_name() {
        let (a, b) = batches();
        let pairing = AlgorithmPairing::new().with("old-x", "new-z");
        let err = pair(&a, &b, &pairing).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownRunName { name, batch: BatchSide::B } if name == "new-z"
        ));
    }

    #[test]
    fn test_pair_tasks_reports_unmatched() {
        let (a, b) = batches();
        let pairing = AlgorithmPairing::new().with("old-y", "new-y");
        let paired = pair_tasks(&a, &b, &pairing).unwrap();
        assert_eq!(paired.rows.len(), 1);
        assert_eq!(paired.unmatched.len(), 1);
        assert_eq!(paired.unmatched[0].task_id, "t2");
        assert_eq!(paired.unmatched[0].missing, vec![BatchSide::A, BatchSide::B]);
    }
}
