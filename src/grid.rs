//! Run grid: revisions × configurations × tasks
//!
//! Every `(revision, config, task)` triple becomes one [`RunSpec`]. The run
//! name is `"{revision}-{nick}"`; it repeats across tasks, so the execution
//! and aggregation layers key runs by [`RunKey`] = `(run_name, task_id)`.
//!
//! ```rust
//! use runlab::grid::{build_grid, AlgorithmConfig, TaskRef};
//!
//! let configs = vec![
//!     AlgorithmConfig::raw("a", vec!["--search".into(), "astar(blind())".into()]),
//!     AlgorithmConfig::raw("b", vec!["--search".into(), "astar(lmcut())".into()]),
//! ];
//! let tasks: Vec<TaskRef> = vec!["gripper:prob01.pddl".parse()?, "gripper:prob02.pddl".parse()?];
//! let runs = build_grid(&["r1".into(), "r2".into()], &configs, &tasks)?;
//! assert_eq!(runs.len(), 8);
//! assert_eq!(runs[0].run_name(), "r1-a");
//! # Ok::<(), runlab::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::solver::SearchAlgorithm;
use crate::{Error, Result};

/// Which grid to build from an experiment definition.
///
/// Selected explicitly by the caller, never inferred from the environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridMode {
    /// Production grid: all revisions, the full suite
    #[default]
    Full,
    /// Fast validation grid: test revisions (if any), the tiny test suite
    Smoke,
}

/// A benchmark task, `domain:problem`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskRef {
    domain: String,
    problem: String,
}

impl TaskRef {
    /// Create a task reference.
    #[must_use]
    pub fn new(domain: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            problem: problem.into(),
        }
    }

    /// Domain directory name.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Problem file name.
    #[must_use]
    pub fn problem(&self) -> &str {
        &self.problem
    }

    /// Task identity used in run keys.
    #[must_use]
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.problem)
    }
}

impl FromStr for TaskRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((domain, problem)) if !domain.is_empty() && !problem.is_empty() => {
                Ok(Self::new(domain, problem))
            }
            _ => Err(Error::InvalidConfig(format!(
                "task '{s}' is not of the form domain:problem"
            ))),
        }
    }
}

impl TryFrom<String> for TaskRef {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TaskRef> for String {
    fn from(task: TaskRef) -> Self {
        task.to_string()
    }
}

/// How a configuration reaches the solver command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverArgs {
    /// Structured search tree, rendered as `--search <expr>`
    Search(SearchAlgorithm),
    /// Literal argument list passed through unchanged
    Args(Vec<String>),
}

impl SolverArgs {
    /// Solver command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::Search(search) => search.to_args(),
            Self::Args(args) => args.clone(),
        }
    }
}

/// A named configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConfigEntry", into = "ConfigEntry")]
pub struct AlgorithmConfig {
    nick: String,
    solver: SolverArgs,
}

/// Serialized form: `nick` may be omitted for structured configurations.
#[derive(Serialize, Deserialize)]
struct ConfigEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nick: Option<String>,
    #[serde(flatten)]
    solver: SolverArgs,
}

impl TryFrom<ConfigEntry> for AlgorithmConfig {
    type Error = Error;

    fn try_from(entry: ConfigEntry) -> Result<Self> {
        match (entry.nick, entry.solver) {
            (Some(nick), solver) => Ok(Self { nick, solver }),
            (None, SolverArgs::Search(search)) => Ok(Self::structured(search)),
            (None, SolverArgs::Args(_)) => Err(Error::InvalidConfig(
                "configurations given as literal args need an explicit nick".to_string(),
            )),
        }
    }
}

impl From<AlgorithmConfig> for ConfigEntry {
    fn from(config: AlgorithmConfig) -> Self {
        Self {
            nick: Some(config.nick),
            solver: config.solver,
        }
    }
}

impl AlgorithmConfig {
    /// Structured configuration named by its derived nickname.
    #[must_use]
    pub fn structured(search: SearchAlgorithm) -> Self {
        Self {
            nick: search.nick(),
            solver: SolverArgs::Search(search),
        }
    }

    /// Structured configuration with an explicit nickname.
    #[must_use]
    pub fn named(nick: impl Into<String>, search: SearchAlgorithm) -> Self {
        Self {
            nick: nick.into(),
            solver: SolverArgs::Search(search),
        }
    }

    /// Literal argument configuration.
    #[must_use]
    pub fn raw(nick: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            nick: nick.into(),
            solver: SolverArgs::Args(args),
        }
    }

    /// Configuration nickname.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Solver argument source.
    #[must_use]
    pub const fn solver(&self) -> &SolverArgs {
        &self.solver
    }

    fn validate(&self) -> Result<()> {
        if self.nick.is_empty() || self.nick.chars().any(char::is_whitespace) {
            return Err(Error::InvalidConfig(format!(
                "config nick '{}' must be non-empty and contain no whitespace",
                self.nick
            )));
        }
        if let SolverArgs::Search(search) = &self.solver {
            search.validate()?;
        }
        Ok(())
    }
}

/// Full identity of one run: `(run_name, task_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunKey {
    /// `"{revision}-{nick}"`
    pub run_name: String,
    /// `domain:problem`
    pub task_id: String,
}

impl RunKey {
    /// Create a run key.
    #[must_use]
    pub fn new(run_name: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            task_id: task_id.into(),
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.run_name, self.task_id)
    }
}

/// Canonical run/algorithm name for a revision and configuration nickname.
#[must_use]
pub fn run_name(revision: &str, nick: &str) -> String {
    format!("{revision}-{nick}")
}

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    revision: String,
    config_nick: String,
    task: TaskRef,
    args: Vec<String>,
}

impl RunSpec {
    /// Solver revision.
    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Configuration nickname.
    #[must_use]
    pub fn config_nick(&self) -> &str {
        &self.config_nick
    }

    /// Benchmark task.
    #[must_use]
    pub const fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Solver arguments for this configuration.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// `"{revision}-{config_nick}"`.
    #[must_use]
    pub fn run_name(&self) -> String {
        run_name(&self.revision, &self.config_nick)
    }

    /// `(run_name, task_id)`.
    #[must_use]
    pub fn key(&self) -> RunKey {
        RunKey::new(self.run_name(), self.task.id())
    }
}

/// Expand the grid: revisions outer, configurations middle, tasks inner.
///
/// All configurations are checked before any run is produced.
///
/// # Errors
///
/// [`Error::DuplicateConfigNick`] if two configurations share a nickname,
/// [`Error::InvalidConfig`] for a duplicate revision or task, an invalid
/// configuration, or two (revision, config) pairs sharing a run name.
pub fn build_grid(
    revisions: &[String],
    configs: &[AlgorithmConfig],
    tasks: &[TaskRef],
) -> Result<Vec<RunSpec>> {
    let mut nicks = FxHashSet::default();
    for config in configs {
        if !nicks.insert(config.nick()) {
            return Err(Error::DuplicateConfigNick(config.nick().to_string()));
        }
        config.validate()?;
    }
    let mut seen_revisions = FxHashSet::default();
    for revision in revisions {
        if !seen_revisions.insert(revision.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "revision '{revision}' listed twice"
            )));
        }
    }
    let mut run_names = FxHashSet::default();
    for revision in revisions {
        for config in configs {
            let name = run_name(revision, config.nick());
            if run_names.contains(&name) {
                return Err(Error::InvalidConfig(format!(
                    "run name '{name}' produced by more than one (revision, config) pair"
                )));
            }
            run_names.insert(name);
        }
    }
    let mut task_ids = FxHashSet::default();
    for task in tasks {
        let id = task.id();
        if task_ids.contains(&id) {
            return Err(Error::InvalidConfig(format!("task '{id}' listed twice")));
        }
        task_ids.insert(id);
    }

    let rendered: Vec<Vec<String>> = configs.iter().map(|c| c.solver().to_args()).collect();
    let mut runs = Vec::with_capacity(revisions.len() * configs.len() * tasks.len());
    for revision in revisions {
        for (config, args) in configs.iter().zip(&rendered) {
            for task in tasks {
                runs.push(RunSpec {
                    revision: revision.clone(),
                    config_nick: config.nick().to_string(),
                    task: task.clone(),
                    args: args.clone(),
                });
            }
        }
    }
    tracing::info!(
        revisions = revisions.len(),
        configs = configs.len(),
        tasks = tasks.len(),
        runs = runs.len(),
        "built run grid"
    );
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{Heuristic, LookupMode, Symmetries};

    fn task(s: &str) -> TaskRef {
        s.parse().unwrap()
    }

    #[test]
    fn test_task_ref_parse() {
        let t = task("gripper:prob01.pddl");
        assert_eq!(t.domain(), "gripper");
        assert_eq!(t.problem(), "prob01.pddl");
        assert_eq!(t.id(), "gripper:prob01.pddl");
        assert!("gripper".parse::<TaskRef>().is_err());
        assert!(":p".parse::<TaskRef>().is_err());
    }

    #[test]
    fn test_grid_order() {
        let configs = vec![
            AlgorithmConfig::raw("a", vec![]),
            AlgorithmConfig::raw("b", vec![]),
        ];
        let tasks = vec![task("d:t1"), task("d:t2")];
        let runs = build_grid(&["r1".into(), "r2".into()], &configs, &tasks).unwrap();
        let keys: Vec<String> = runs.iter().map(|r| r.key().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "r1-a on d:t1",
                "r1-a on d:t2",
                "r1-b on d:t1",
                "r1-b on d:t2",
                "r2-a on d:t1",
                "r2-a on d:t2",
                "r2-b on d:t1",
                "r2-b on d:t2",
            ]
        );
    }

    #[test]
    fn test_duplicate_nick_rejected() {
        let configs = vec![
            AlgorithmConfig::raw("a", vec![]),
            AlgorithmConfig::raw("a", vec!["--x".into()]),
        ];
        let err = build_grid(&["r1".into()], &configs, &[task("d:t1")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateConfigNick(nick) if nick == "a"));
    }

    #[test]
    fn test_colliding_run_names_rejected() {
        // "v1" + "ms-lookups" and "v1-ms" + "lookups" both name "v1-ms-lookups"
        let configs = vec![
            AlgorithmConfig::raw("ms-lookups", vec![]),
            AlgorithmConfig::raw("lookups", vec![]),
        ];
        let err = build_grid(&["v1".into(), "v1-ms".into()], &configs, &[task("d:t")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("'v1-ms-lookups'")));
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let configs = vec![AlgorithmConfig::raw("a", vec![])];
        let err = build_grid(&["r1".into()], &configs, &[task("d:t"), task("d:t")]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("'d:t'")));
    }

    #[test]
    fn test_duplicate_revision_rejected() {
        let configs = vec![AlgorithmConfig::raw("a", vec![])];
        let err = build_grid(&["r1".into(), "r1".into()], &configs, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_structured_config_args_and_nick() {
        let config = AlgorithmConfig::structured(crate::solver::SearchAlgorithm::astar(
            Heuristic::with_lookups(
                Heuristic::Ipdb { max_time: 900 },
                Symmetries::lookups(LookupMode::AllStates),
            ),
        ));
        assert_eq!(config.nick(), "ipdb-lookups-all");
        let runs = build_grid(&["rev".into()], &[config], &[task("d:t")]).unwrap();
        assert_eq!(runs[0].run_name(), "rev-ipdb-lookups-all");
        assert_eq!(runs[0].args()[0], "--search");
        assert!(runs[0].args()[1].starts_with("astar(sl_heuristic("));
    }

    #[test]
    fn test_invalid_structured_config_rejected_before_runs() {
        let config = AlgorithmConfig::named(
            "bad",
            crate::solver::SearchAlgorithm::astar(Heuristic::with_lookups(
                Heuristic::Ipdb { max_time: 900 },
                Symmetries::lookups(LookupMode::SubsetOfStates { states: 0 }),
            )),
        );
        assert!(build_grid(&["rev".into()], &[config], &[task("d:t")]).is_err());
    }

    #[test]
    fn test_config_json_nick_optional_for_search() {
        let json = serde_json::json!({
            "search": {
                "algorithm": "astar",
                "heuristic": {"type": "ipdb", "max_time": 900}
            }
        });
        let config: AlgorithmConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.nick(), "ipdb");

        let raw = serde_json::json!({"args": ["--search", "astar(blind())"]});
        assert!(serde_json::from_value::<AlgorithmConfig>(raw).is_err());
    }
}
