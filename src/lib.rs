//! # Runlab: Benchmark Experiment Pipeline for Planner Runs
//!
//! Runlab turns the raw text output of solver runs into structured property
//! records, lays out the grid of runs an experiment needs, and aggregates
//! results across independently executed batches.
//!
//! ## Pipeline
//!
//! ```text
//! ExperimentDefinition ──grid──> RunSpec (N) ──Executor──> RunOutput (N)
//!                                                              │
//!                               Parser (patterns + derived) ───┤ process
//!                                                              ▼
//!                       ExperimentBatch ──merge / pair / compare──> reports
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use runlab::experiment::{process_outputs, ExitCodePolicy, RunOutput};
//! use runlab::grid::RunKey;
//! use runlab::parser::presets;
//!
//! let parser = presets::default_parser()?;
//! let outputs = vec![RunOutput::finished(
//!     RunKey::new("r1-ms-lookups-one5", "gripper:prob01.pddl"),
//!     "Symmetrical states generated: 120\nEvaluated 40 state(s).\n",
//!     0,
//! )];
//! let (batch, report) = process_outputs("r1", &parser, &outputs, &ExitCodePolicy::AlwaysParse)?;
//! let record = batch.record("r1-ms-lookups-one5", "gripper:prob01.pddl").unwrap();
//! assert_eq!(record.get_f64("symmetrical_states_per_evaluation"), Some(3.0));
//! assert_eq!(report.parsed, 1);
//! # Ok::<(), runlab::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod compare;
pub mod error;
pub mod exec;
pub mod experiment;
pub mod grid;
pub mod parser;
pub mod properties;
pub mod solver;

pub use error::{Error, Result};
