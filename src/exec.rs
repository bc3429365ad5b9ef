//! Execution backends: submit a run, get its raw output back
//!
//! The crate does not schedule cluster jobs. [`Executor`] is the seam where
//! a backend plugs in; [`LocalExecutor`] runs the solver on this machine
//! with a fixed number of worker threads.

use std::path::{Path, PathBuf};
use std::process::Command;

use rustc_hash::FxHashMap;

use crate::experiment::RunOutput;
use crate::grid::RunSpec;
use crate::{Error, Result};

/// Turns a run into its raw output.
///
/// Failures to start or finish a run are reported through
/// [`RunOutput::missing`], never by panicking.
pub trait Executor: Sync {
    /// Execute one run.
    fn execute(&self, run: &RunSpec) -> RunOutput;

    /// Execute runs, returning outputs in input order.
    fn execute_all(&self, runs: &[RunSpec]) -> Vec<RunOutput> {
        runs.iter().map(|run| self.execute(run)).collect()
    }
}

impl<F> Executor for F
where
    F: Fn(&RunSpec) -> RunOutput + Sync,
{
    fn execute(&self, run: &RunSpec) -> RunOutput {
        self(run)
    }
}

/// Placeholder in a solver path replaced by the run's revision.
pub const REVISION_PLACEHOLDER: &str = "{revision}";

/// Runs the solver binary as a local subprocess.
///
/// The command line is `solver [domain.pddl] problem <args...>`, with the
/// domain file passed only when `benchmarks/<domain>/domain.pddl` exists.
/// Stdout and stderr are concatenated into the raw text.
///
/// Each revision resolves to its own binary: an explicit
/// [`with_revision_solver`](Self::with_revision_solver) entry wins, otherwise
/// the default path with [`REVISION_PLACEHOLDER`] substituted.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    solver: PathBuf,
    revision_solvers: FxHashMap<String, PathBuf>,
    benchmarks_dir: PathBuf,
    processes: usize,
}

impl LocalExecutor {
    /// Create an executor with one worker.
    #[must_use]
    pub fn new(solver: impl Into<PathBuf>, benchmarks_dir: impl Into<PathBuf>) -> Self {
        Self {
            solver: solver.into(),
            revision_solvers: FxHashMap::default(),
            benchmarks_dir: benchmarks_dir.into(),
            processes: 1,
        }
    }

    /// Use `solver` for runs of `revision`.
    #[must_use]
    pub fn with_revision_solver(
        mut self,
        revision: impl Into<String>,
        solver: impl Into<PathBuf>,
    ) -> Self {
        self.revision_solvers.insert(revision.into(), solver.into());
        self
    }

    /// Number of runs executed concurrently (at least 1).
    #[must_use]
    pub fn with_processes(mut self, processes: usize) -> Self {
        self.processes = processes.max(1);
        self
    }

    /// Configured worker count.
    #[must_use]
    pub const fn processes(&self) -> usize {
        self.processes
    }

    /// Default solver path, possibly containing [`REVISION_PLACEHOLDER`].
    #[must_use]
    pub fn solver(&self) -> &Path {
        &self.solver
    }

    /// Binary that runs `revision`.
    #[must_use]
    pub fn solver_for(&self, revision: &str) -> PathBuf {
        if let Some(solver) = self.revision_solvers.get(revision) {
            return solver.clone();
        }
        let default = self.solver.to_string_lossy();
        if default.contains(REVISION_PLACEHOLDER) {
            PathBuf::from(default.replace(REVISION_PLACEHOLDER, revision))
        } else {
            self.solver.clone()
        }
    }

    /// Check that every revision in `runs` has a binary of its own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when a revision resolves to an empty
    /// path or when two revisions resolve to the same binary.
    pub fn check_revisions(&self, runs: &[RunSpec]) -> Result<()> {
        let mut owners: FxHashMap<PathBuf, &str> = FxHashMap::default();
        for run in runs {
            let revision = run.revision();
            let solver = self.solver_for(revision);
            if solver.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "no solver given for revision '{revision}'"
                )));
            }
            match owners.get(&solver) {
                Some(owner) if *owner != revision => {
                    return Err(Error::InvalidConfig(format!(
                        "revisions '{owner}' and '{revision}' both resolve to solver {}",
                        solver.display()
                    )));
                }
                Some(_) => {}
                None => {
                    owners.insert(solver, revision);
                }
            }
        }
        Ok(())
    }

    fn command(&self, run: &RunSpec) -> Command {
        let domain_dir = self.benchmarks_dir.join(run.task().domain());
        let domain_file = domain_dir.join("domain.pddl");
        let mut cmd = Command::new(self.solver_for(run.revision()));
        if domain_file.is_file() {
            cmd.arg(domain_file);
        }
        cmd.arg(domain_dir.join(run.task().problem()));
        cmd.args(run.args());
        cmd
    }
}

impl Executor for LocalExecutor {
    fn execute(&self, run: &RunSpec) -> RunOutput {
        let key = run.key();
        let output = match self.command(run).output() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    run = %key,
                    solver = %self.solver_for(run.revision()).display(),
                    "failed to start solver: {e}"
                );
                return RunOutput::missing(key);
            }
        };
        let mut raw_text = String::from_utf8_lossy(&output.stdout).into_owned();
        raw_text.push_str(&String::from_utf8_lossy(&output.stderr));
        tracing::debug!(run = %key, exit_code = ?output.status.code(), "run finished");
        RunOutput {
            key,
            raw_text: Some(raw_text),
            exit_code: output.status.code(),
        }
    }

    #[cfg(feature = "parallel")]
    fn execute_all(&self, runs: &[RunSpec]) -> Vec<RunOutput> {
        use rayon::prelude::*;

        tracing::info!(runs = runs.len(), processes = self.processes, "executing runs");
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.processes)
            .build()
        {
            Ok(pool) => pool.install(|| runs.par_iter().map(|run| self.execute(run)).collect()),
            Err(e) => {
                tracing::warn!("could not build worker pool, running sequentially: {e}");
                runs.iter().map(|run| self.execute(run)).collect()
            }
        }
    }
}
