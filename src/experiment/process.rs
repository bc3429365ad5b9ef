//! Turning raw run outputs into a batch
//!
//! Each output is parsed independently against a shared, read-only
//! [`Parser`]. With the `parallel` feature the outputs are parsed on the
//! rayon pool; the resulting batch keeps the input order either way.
//! Per-run failures end up in the run's outcome and in the
//! [`ProcessingReport`]; they never abort the batch.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BatchEntry, ExperimentBatch, RunOutcome, RunStatus};
use crate::grid::RunKey;
use crate::parser::Parser;
use crate::Result;

/// Raw output of one run as delivered by the execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    /// `(run_name, task_id)`
    #[serde(flatten)]
    pub key: RunKey,
    /// Captured text; `None` if the run was canceled or timed out before
    /// producing output
    pub raw_text: Option<String>,
    /// Process exit code, if the process exited
    pub exit_code: Option<i32>,
}

impl RunOutput {
    /// Output of a finished run.
    #[must_use]
    pub fn finished(key: RunKey, raw_text: impl Into<String>, exit_code: i32) -> Self {
        Self {
            key,
            raw_text: Some(raw_text.into()),
            exit_code: Some(exit_code),
        }
    }

    /// A run that produced nothing.
    #[must_use]
    pub const fn missing(key: RunKey) -> Self {
        Self {
            key,
            raw_text: None,
            exit_code: None,
        }
    }
}

/// Whether a run's exit code allows parsing its output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCodePolicy {
    /// Parse whatever text the run produced.
    #[default]
    AlwaysParse,
    /// Parse only if the exit code is in the list; otherwise no result.
    RequireExitCode(Vec<i32>),
}

impl ExitCodePolicy {
    fn allows(&self, exit_code: Option<i32>) -> bool {
        match self {
            Self::AlwaysParse => true,
            Self::RequireExitCode(codes) => exit_code.is_some_and(|c| codes.contains(&c)),
        }
    }
}

/// Decide the outcome of one run.
#[must_use]
pub fn process_output(parser: &Parser, output: &RunOutput, policy: &ExitCodePolicy) -> RunOutcome {
    let Some(raw_text) = output.raw_text.as_deref() else {
        return RunOutcome::no_result("run produced no output");
    };
    if !policy.allows(output.exit_code) {
        return RunOutcome::no_result(match output.exit_code {
            Some(code) => format!("exit code {code} not accepted for parsing"),
            None => "run did not exit normally".to_string(),
        });
    }
    parser.parse(raw_text).into()
}

#[cfg(feature = "parallel")]
fn outcomes(parser: &Parser, outputs: &[RunOutput], policy: &ExitCodePolicy) -> Vec<RunOutcome> {
    use rayon::prelude::*;

    outputs
        .par_iter()
        .map(|output| process_output(parser, output, policy))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn outcomes(parser: &Parser, outputs: &[RunOutput], policy: &ExitCodePolicy) -> Vec<RunOutcome> {
    outputs
        .iter()
        .map(|output| process_output(parser, output, policy))
        .collect()
}

/// Parse every output into a batch and summarize the result.
///
/// # Errors
///
/// [`crate::Error::DuplicateRun`] if two outputs share a key. Parse errors
/// are not returned; they are recorded per run.
pub fn process_outputs(
    batch_name: impl Into<String>,
    parser: &Parser,
    outputs: &[RunOutput],
    policy: &ExitCodePolicy,
) -> Result<(ExperimentBatch, ProcessingReport)> {
    let outcomes = outcomes(parser, outputs, policy);
    let mut batch = ExperimentBatch::new(batch_name);
    for (output, outcome) in outputs.iter().zip(outcomes) {
        match &outcome {
            RunOutcome::Unparsed { kind, message } => tracing::warn!(
                run = %output.key.run_name,
                task = %output.key.task_id,
                kind = %kind,
                "{message}"
            ),
            RunOutcome::NoResult { reason } => tracing::debug!(
                run = %output.key.run_name,
                task = %output.key.task_id,
                "no result: {reason}"
            ),
            RunOutcome::Parsed { .. } => {}
        }
        batch.insert(BatchEntry::new(output.key.clone(), output.exit_code, outcome))?;
    }
    let report = ProcessingReport::from_batch(&batch);
    tracing::info!(
        batch = batch.name(),
        parsed = report.parsed,
        unparsed = report.unparsed,
        no_result = report.no_result,
        "processed run outputs"
    );
    Ok((batch, report))
}

/// One line of a processing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// `(run_name, task_id)`
    #[serde(flatten)]
    pub key: RunKey,
    /// Coarse status
    pub status: RunStatus,
    /// Error kind and message, or the no-result reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Per-run summary of a batch: every run is listed with its status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingReport {
    /// Runs parsed into records
    pub parsed: usize,
    /// Runs whose output failed to parse
    pub unparsed: usize,
    /// Runs without output
    pub no_result: usize,
    /// One line per run, in batch order
    pub lines: Vec<ReportLine>,
}

impl ProcessingReport {
    /// Summarize a batch.
    #[must_use]
    pub fn from_batch(batch: &ExperimentBatch) -> Self {
        let mut report = Self::default();
        for entry in batch.entries() {
            let detail = match &entry.outcome {
                RunOutcome::Parsed { .. } => {
                    report.parsed += 1;
                    None
                }
                RunOutcome::Unparsed { kind, message } => {
                    report.unparsed += 1;
                    Some(format!("{kind}: {message}"))
                }
                RunOutcome::NoResult { reason } => {
                    report.no_result += 1;
                    Some(reason.clone())
                }
            };
            report.lines.push(ReportLine {
                key: entry.key.clone(),
                status: entry.outcome.status(),
                detail,
            });
        }
        report
    }

    /// Total number of runs.
    #[must_use]
    pub fn total(&self) -> usize {
        self.lines.len()
    }

    /// Lines that are not parsed records.
    pub fn failures(&self) -> impl Iterator<Item = &ReportLine> {
        self.lines.iter().filter(|l| l.status != RunStatus::Parsed)
    }
}

impl fmt::Display for ProcessingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} runs: {} parsed, {} unparsed, {} without result",
            self.total(),
            self.parsed,
            self.unparsed,
            self.no_result
        )?;
        for line in self.failures() {
            write!(f, "  {} [{:?}]", line.key, line.status)?;
            if let Some(detail) = &line.detail {
                write!(f, " {detail}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
