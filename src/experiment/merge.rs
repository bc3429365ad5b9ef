//! Cross-batch merge keyed by run name

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::ExperimentBatch;
use crate::{Error, Result};

/// How duplicate run names across batches are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// A run name in more than one batch is an error.
    #[default]
    Strict,
    /// Later batches replace every entry of a run name from earlier batches.
    Overlay,
}

/// Merge batches into one.
///
/// Ownership of a run name is all-or-nothing: in overlay mode, the last batch
/// containing a run name contributes all of that run's tasks and earlier
/// batches contribute none.
///
/// # Errors
///
/// [`Error::ConflictingRunName`] in strict mode when a run name appears in
/// more than one batch.
pub fn merge(batches: &[ExperimentBatch], mode: MergeMode) -> Result<ExperimentBatch> {
    // Run name -> index of the batch that owns it.
    let mut owner: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, batch) in batches.iter().enumerate() {
        for name in batch.run_names() {
            if let Some(previous) = owner.insert(name, i) {
                if mode == MergeMode::Strict {
                    return Err(Error::ConflictingRunName(name.to_string()));
                }
                tracing::debug!(
                    run_name = name,
                    replaced = batches[previous].name(),
                    by = batch.name(),
                    "overlay merge replaced run"
                );
            }
        }
    }

    let name = batches
        .iter()
        .map(ExperimentBatch::name)
        .collect::<Vec<_>>()
        .join("+");
    let mut merged = ExperimentBatch::new(name);
    let mut overridden = FxHashSet::default();
    for (i, batch) in batches.iter().enumerate() {
        for entry in batch.entries() {
            if owner.get(entry.key.run_name.as_str()) == Some(&i) {
                merged.insert(entry.clone())?;
            } else {
                overridden.insert(entry.key.run_name.as_str());
            }
        }
    }
    tracing::info!(
        batches = batches.len(),
        entries = merged.len(),
        overridden_runs = overridden.len(),
        ?mode,
        "merged batches"
    );
    Ok(merged)
}
