//! Experiment Batch - outcomes of one execution session
//!
//! A batch is an ordered collection of run outcomes keyed by
//! `(run_name, task_id)`. Insertion order is preserved for presentation;
//! a hash index gives O(1) lookups by key.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::RunOutcome;
use crate::grid::RunKey;
use crate::properties::PropertyRecord;
use crate::{Error, Result};

/// One run of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// `(run_name, task_id)`
    #[serde(flatten)]
    pub key: RunKey,
    /// Exit code reported by the execution backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// What became of the run's output
    pub outcome: RunOutcome,
}

impl BatchEntry {
    /// Create an entry.
    #[must_use]
    pub const fn new(key: RunKey, exit_code: Option<i32>, outcome: RunOutcome) -> Self {
        Self {
            key,
            exit_code,
            outcome,
        }
    }

    /// Shortcut for a parsed entry without exit code.
    #[must_use]
    pub fn parsed(
        run_name: impl Into<String>,
        task_id: impl Into<String>,
        properties: PropertyRecord,
    ) -> Self {
        Self::new(
            RunKey::new(run_name, task_id),
            None,
            RunOutcome::Parsed { properties },
        )
    }
}

/// Ordered, indexed collection of run outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredBatch", into = "StoredBatch")]
pub struct ExperimentBatch {
    name: String,
    created_at: DateTime<Utc>,
    entries: Vec<BatchEntry>,
    index: FxHashMap<RunKey, usize>,
}

#[derive(Serialize, Deserialize)]
struct StoredBatch {
    name: String,
    created_at: DateTime<Utc>,
    entries: Vec<BatchEntry>,
}

impl TryFrom<StoredBatch> for ExperimentBatch {
    type Error = Error;

    fn try_from(stored: StoredBatch) -> Result<Self> {
        let mut batch = Self::new(stored.name);
        batch.created_at = stored.created_at;
        for entry in stored.entries {
            batch.insert(entry)?;
        }
        Ok(batch)
    }
}

impl From<ExperimentBatch> for StoredBatch {
    fn from(batch: ExperimentBatch) -> Self {
        Self {
            name: batch.name,
            created_at: batch.created_at,
            entries: batch.entries,
        }
    }
}

impl PartialEq for ExperimentBatch {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.entries == other.entries
    }
}

impl ExperimentBatch {
    /// Create an empty batch stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Build a batch from entries.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateRun`] if two entries share a key.
    pub fn from_entries(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = BatchEntry>,
    ) -> Result<Self> {
        let mut batch = Self::new(name);
        for entry in entries {
            batch.insert(entry)?;
        }
        Ok(batch)
    }

    /// Batch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the batch has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateRun`] if the key is already present.
    pub fn insert(&mut self, entry: BatchEntry) -> Result<()> {
        if self.index.contains_key(&entry.key) {
            return Err(Error::DuplicateRun {
                run_name: entry.key.run_name,
                task_id: entry.key.task_id,
            });
        }
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Entry for a run on a task.
    #[must_use]
    pub fn get(&self, run_name: &str, task_id: &str) -> Option<&BatchEntry> {
        self.index
            .get(&RunKey::new(run_name, task_id))
            .map(|&i| &self.entries[i])
    }

    /// Parsed record for a run on a task.
    #[must_use]
    pub fn record(&self, run_name: &str, task_id: &str) -> Option<&PropertyRecord> {
        self.get(run_name, task_id)
            .and_then(|entry| entry.outcome.properties())
    }

    /// Whether any entry has this run name.
    #[must_use]
    pub fn contains_run(&self, run_name: &str) -> bool {
        self.entries.iter().any(|e| e.key.run_name == run_name)
    }

    /// Entries of one run name, in insertion order.
    pub fn runs<'a>(&'a self, run_name: &'a str) -> impl Iterator<Item = &'a BatchEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.key.run_name == run_name)
    }

    /// Distinct run names in order of first appearance.
    #[must_use]
    pub fn run_names(&self) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        self.entries
            .iter()
            .map(|e| e.key.run_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Keep only the given run names (a fetch with an algorithm filter).
    #[must_use]
    pub fn filter_algorithms(&self, run_names: &[String]) -> Self {
        let keep: FxHashSet<&str> = run_names.iter().map(String::as_str).collect();
        let mut filtered = Self::new(self.name.clone());
        filtered.created_at = self.created_at;
        for entry in &self.entries {
            if keep.contains(entry.key.run_name.as_str()) {
                filtered.index.insert(entry.key.clone(), filtered.entries.len());
                filtered.entries.push(entry.clone());
            }
        }
        filtered
    }

    /// Write the batch as pretty JSON.
    ///
    /// # Errors
    ///
    /// IO or serialization failure.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Read a batch written by [`save_json`](Self::save_json).
    ///
    /// # Errors
    ///
    /// IO, deserialization, or duplicate-key failure.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let batch = serde_json::from_str(&text)?;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExperimentBatch {
        ExperimentBatch::from_entries(
            "sample",
            vec![
                BatchEntry::parsed("r1-a", "d:t1", PropertyRecord::new().with("cost", 1_i64)),
                BatchEntry::parsed("r1-b", "d:t1", PropertyRecord::new().with("cost", 2_i64)),
                BatchEntry::parsed("r1-a", "d:t2", PropertyRecord::new().with("cost", 3_i64)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_batch_default() {
        let batch = ExperimentBatch::new("empty");
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert!(batch.run_names().is_empty());
    }

    #[test]
    fn test_batch_lookup() {
        let batch = sample();
        assert_eq!(batch.record("r1-a", "d:t2").unwrap().get_i64("cost"), Some(3));
        assert!(batch.record("r1-b", "d:t2").is_none());
        assert!(batch.contains_run("r1-b"));
        assert!(!batch.contains_run("r2-a"));
        assert_eq!(batch.run_names(), vec!["r1-a", "r1-b"]);
        assert_eq!(batch.runs("r1-a").count(), 2);
    }

    #[test]
    fn test_batch_duplicate_key_rejected() {
        let mut batch = sample();
        let err = batch
            .insert(BatchEntry::parsed("r1-a", "d:t1", PropertyRecord::new()))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRun { .. }));
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_filter_algorithms() {
        let filtered = sample().filter_algorithms(&["r1-b".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.record("r1-b", "d:t1").is_some());
        assert!(filtered.get("r1-a", "d:t1").is_none());
    }

    #[test]
    fn test_json_roundtrip_rebuilds_index() {
        let batch = sample();
        let json = serde_json::to_string(&batch).unwrap();
        let back: ExperimentBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, batch);
        assert_eq!(back.created_at(), batch.created_at());
        assert_eq!(back.record("r1-a", "d:t1").unwrap().get_i64("cost"), Some(1));
    }
}
