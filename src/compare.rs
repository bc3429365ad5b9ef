//! Old-vs-new comparison of paired algorithms
//!
//! For every declared pair and every attribute, [`compare`] aggregates the
//! attribute over tasks on each side and reports both values and their
//! difference. Absent values are skipped; they never count as zero.
//!
//! - Relative attributes (`absolute = false`) aggregate only over tasks where
//!   both sides have a value, so the two numbers describe the same tasks.
//! - Absolute attributes aggregate each side over every task it has a value
//!   for.

use serde::{Deserialize, Serialize};

use crate::error::BatchSide;
use crate::experiment::{pair_tasks, AlgorithmPairing, ExperimentBatch};
use crate::Result;

/// Smallest value entering a geometric mean.
pub const GEOMETRIC_MEAN_FLOOR: f64 = 0.1;

/// How per-task values are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    /// Sum of values
    #[default]
    Sum,
    /// Average of values
    ArithmeticMean,
    /// `exp(mean(ln(max(v, 0.1))))`
    GeometricMean,
}

impl Aggregate {
    /// Combine values; `None` for an empty slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        Some(match self {
            Self::Sum => values.iter().sum(),
            Self::ArithmeticMean => values.iter().sum::<f64>() / n,
            Self::GeometricMean => {
                let log_sum: f64 = values
                    .iter()
                    .map(|v| v.max(GEOMETRIC_MEAN_FLOOR).ln())
                    .sum();
                (log_sum / n).exp()
            }
        })
    }
}

const fn default_min_wins() -> bool {
    true
}

/// A reported attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Property name
    pub name: String,
    /// Aggregate over all tasks with a value instead of common tasks only
    #[serde(default)]
    pub absolute: bool,
    /// Whether smaller values are better
    #[serde(default = "default_min_wins")]
    pub min_wins: bool,
    /// Aggregation function
    #[serde(default)]
    pub aggregate: Aggregate,
}

impl Attribute {
    /// Relative, min-wins, summed attribute.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            absolute: false,
            min_wins: true,
            aggregate: Aggregate::Sum,
        }
    }

    /// Aggregate over all tasks with a value.
    #[must_use]
    pub const fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    /// Larger values are better.
    #[must_use]
    pub const fn max_wins(mut self) -> Self {
        self.min_wins = false;
        self
    }

    /// Set the aggregation function.
    #[must_use]
    pub const fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }
}

/// One attribute of one algorithm pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Run name in batch A
    pub name_a: String,
    /// Run name in batch B
    pub name_b: String,
    /// Attribute name
    pub attribute: String,
    /// Tasks aggregated on side A
    pub tasks_a: usize,
    /// Tasks aggregated on side B
    pub tasks_b: usize,
    /// Aggregate on side A
    pub value_a: Option<f64>,
    /// Aggregate on side B
    pub value_b: Option<f64>,
    /// `value_b - value_a`
    pub diff: Option<f64>,
    /// Side with the better aggregate; `None` on a tie or missing value
    pub winner: Option<BatchSide>,
}

fn winner(value_a: Option<f64>, value_b: Option<f64>, min_wins: bool) -> Option<BatchSide> {
    let (a, b) = (value_a?, value_b?);
    if a == b {
        None
    } else if (a < b) == min_wins {
        Some(BatchSide::A)
    } else {
        Some(BatchSide::B)
    }
}

fn absolute_values(batch: &ExperimentBatch, run_name: &str, attribute: &str) -> Vec<f64> {
    batch
        .runs(run_name)
        .filter_map(|entry| entry.outcome.properties())
        .filter_map(|record| record.get_f64(attribute))
        .collect()
}

/// Compare paired algorithms attribute by attribute.
///
/// Rows are ordered by declared pair, then by attribute.
///
/// # Errors
///
/// [`crate::Error::UnknownRunName`] if a declared name is absent from its
/// batch.
pub fn compare(
    batch_a: &ExperimentBatch,
    batch_b: &ExperimentBatch,
    pairing: &AlgorithmPairing,
    attributes: &[Attribute],
) -> Result<Vec<ComparisonRow>> {
    let paired = pair_tasks(batch_a, batch_b, pairing)?;
    let mut rows = Vec::with_capacity(pairing.len() * attributes.len());
    for (name_a, name_b) in pairing.pairs() {
        for attribute in attributes {
            let (values_a, values_b) = if attribute.absolute {
                (
                    absolute_values(batch_a, name_a, &attribute.name),
                    absolute_values(batch_b, name_b, &attribute.name),
                )
            } else {
                paired
                    .rows
                    .iter()
                    .filter(|row| &row.name_a == name_a && &row.name_b == name_b)
                    .filter_map(|row| {
                        Some((row.a.get_f64(&attribute.name)?, row.b.get_f64(&attribute.name)?))
                    })
                    .unzip()
            };
            let value_a = attribute.aggregate.apply(&values_a);
            let value_b = attribute.aggregate.apply(&values_b);
            rows.push(ComparisonRow {
                name_a: name_a.clone(),
                name_b: name_b.clone(),
                attribute: attribute.name.clone(),
                tasks_a: values_a.len(),
                tasks_b: values_b.len(),
                value_a,
                value_b,
                diff: value_a.zip(value_b).map(|(a, b)| b - a),
                winner: winner(value_a, value_b, attribute.min_wins),
            });
        }
    }
    tracing::debug!(
        pairs = pairing.len(),
        attributes = attributes.len(),
        unmatched_tasks = paired.unmatched.len(),
        "compared batches"
    );
    Ok(rows)
}
