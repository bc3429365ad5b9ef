//! Experiment Definition - revisions, configurations and suites as data

use std::fs;
use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::{AlgorithmPairing, ExitCodePolicy};
use crate::compare::Attribute;
use crate::grid::{build_grid, run_name, AlgorithmConfig, GridMode, RunSpec, TaskRef};
use crate::{Error, Result};

/// A named old-vs-new comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSpec {
    /// Report name, e.g. `compare-ipdb`
    pub name: String,
    /// Revision of the algorithms in batch A
    pub old_revision: String,
    /// Revision of the algorithms in batch B
    pub new_revision: String,
    /// Only configurations whose nick starts with this prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick_prefix: Option<String>,
}

/// Experiment Definition describes one benchmark study.
///
/// Experiment scripts differ only in this data; the grid, parsing and
/// aggregation logic is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentDefinition {
    name: String,
    revisions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    test_revisions: Option<Vec<String>>,
    configs: Vec<AlgorithmConfig>,
    suite: Vec<TaskRef>,
    #[serde(default)]
    test_suite: Vec<TaskRef>,
    #[serde(default)]
    comparisons: Vec<ComparisonSpec>,
    #[serde(default)]
    attributes: Vec<Attribute>,
    #[serde(default)]
    exit_code_policy: ExitCodePolicy,
}

impl ExperimentDefinition {
    /// Create a builder with the required fields.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ExperimentDefinitionBuilder {
        ExperimentDefinitionBuilder::new(name)
    }

    /// Parse and validate a JSON definition.
    ///
    /// # Errors
    ///
    /// Deserialization failure, or a validation error (see [`validate`](Self::validate)).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Read, parse and validate a JSON definition file.
    ///
    /// # Errors
    ///
    /// IO, deserialization, or validation failure.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let definition = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            name = %definition.name,
            "loaded experiment definition"
        );
        Ok(definition)
    }

    /// Check nick uniqueness and comparison names.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateConfigNick`] or [`Error::InvalidConfig`].
    pub fn validate(&self) -> Result<()> {
        let mut nicks = FxHashSet::default();
        for config in &self.configs {
            if !nicks.insert(config.nick()) {
                return Err(Error::DuplicateConfigNick(config.nick().to_string()));
            }
        }
        let mut names = FxHashSet::default();
        for comparison in &self.comparisons {
            if !names.insert(comparison.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "comparison '{}' defined twice",
                    comparison.name
                )));
            }
        }
        Ok(())
    }

    /// Experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Production revisions.
    #[must_use]
    pub fn revisions(&self) -> &[String] {
        &self.revisions
    }

    /// Named configurations.
    #[must_use]
    pub fn configs(&self) -> &[AlgorithmConfig] {
        &self.configs
    }

    /// Declared comparisons.
    #[must_use]
    pub fn comparisons(&self) -> &[ComparisonSpec] {
        &self.comparisons
    }

    /// Report attributes.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Exit-code policy for parsing.
    #[must_use]
    pub const fn exit_code_policy(&self) -> &ExitCodePolicy {
        &self.exit_code_policy
    }

    /// Revisions used in the given mode.
    #[must_use]
    pub fn revisions_for(&self, mode: GridMode) -> &[String] {
        match (mode, &self.test_revisions) {
            (GridMode::Smoke, Some(test_revisions)) => test_revisions,
            _ => &self.revisions,
        }
    }

    /// Tasks used in the given mode.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] when a smoke grid is requested but no test
    /// suite is declared.
    pub fn tasks_for(&self, mode: GridMode) -> Result<&[TaskRef]> {
        match mode {
            GridMode::Full => Ok(&self.suite),
            GridMode::Smoke if self.test_suite.is_empty() => Err(Error::InvalidConfig(format!(
                "experiment '{}' declares no test suite for smoke runs",
                self.name
            ))),
            GridMode::Smoke => Ok(&self.test_suite),
        }
    }

    /// Build the run grid for `mode`.
    ///
    /// # Errors
    ///
    /// Any grid-construction error.
    pub fn grid(&self, mode: GridMode) -> Result<Vec<RunSpec>> {
        tracing::info!(experiment = %self.name, ?mode, "building grid");
        build_grid(self.revisions_for(mode), &self.configs, self.tasks_for(mode)?)
    }

    /// `"{revision}-{nick}"` for every configuration.
    #[must_use]
    pub fn algorithm_names(&self, revision: &str) -> Vec<String> {
        self.configs
            .iter()
            .map(|c| run_name(revision, c.nick()))
            .collect()
    }

    /// Pair `{old}-{nick}` with `{new}-{nick}` for every configuration.
    #[must_use]
    pub fn revision_pairs(&self, old_revision: &str, new_revision: &str) -> AlgorithmPairing {
        AlgorithmPairing::revisions(
            old_revision,
            new_revision,
            self.configs.iter().map(AlgorithmConfig::nick),
        )
    }

    /// Look up a comparison by name.
    #[must_use]
    pub fn comparison(&self, name: &str) -> Option<&ComparisonSpec> {
        self.comparisons.iter().find(|c| c.name == name)
    }

    /// Pairing of old and new algorithms for a comparison, in config order.
    #[must_use]
    pub fn pairing(&self, comparison: &ComparisonSpec) -> AlgorithmPairing {
        let nicks = self.configs.iter().map(AlgorithmConfig::nick).filter(|nick| {
            comparison
                .nick_prefix
                .as_deref()
                .map_or(true, |prefix| nick.starts_with(prefix))
        });
        AlgorithmPairing::revisions(&comparison.old_revision, &comparison.new_revision, nicks)
    }
}

/// Builder for `ExperimentDefinition`.
#[derive(Debug)]
pub struct ExperimentDefinitionBuilder {
    definition: ExperimentDefinition,
}

impl ExperimentDefinitionBuilder {
    /// Create a new builder with an empty grid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: ExperimentDefinition {
                name: name.into(),
                revisions: Vec::new(),
                test_revisions: None,
                configs: Vec::new(),
                suite: Vec::new(),
                test_suite: Vec::new(),
                comparisons: Vec::new(),
                attributes: Vec::new(),
                exit_code_policy: ExitCodePolicy::default(),
            },
        }
    }

    /// Add a revision.
    #[must_use]
    pub fn revision(mut self, revision: impl Into<String>) -> Self {
        self.definition.revisions.push(revision.into());
        self
    }

    /// Restrict smoke runs to these revisions.
    #[must_use]
    pub fn test_revisions(mut self, revisions: Vec<String>) -> Self {
        self.definition.test_revisions = Some(revisions);
        self
    }

    /// Add a configuration.
    #[must_use]
    pub fn config(mut self, config: AlgorithmConfig) -> Self {
        self.definition.configs.push(config);
        self
    }

    /// Set the production suite.
    #[must_use]
    pub fn suite(mut self, suite: Vec<TaskRef>) -> Self {
        self.definition.suite = suite;
        self
    }

    /// Set the smoke-test suite.
    #[must_use]
    pub fn test_suite(mut self, suite: Vec<TaskRef>) -> Self {
        self.definition.test_suite = suite;
        self
    }

    /// Add a comparison.
    #[must_use]
    pub fn comparison(mut self, comparison: ComparisonSpec) -> Self {
        self.definition.comparisons.push(comparison);
        self
    }

    /// Add a report attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.definition.attributes.push(attribute);
        self
    }

    /// Set the exit-code policy.
    #[must_use]
    pub fn exit_code_policy(mut self, policy: ExitCodePolicy) -> Self {
        self.definition.exit_code_policy = policy;
        self
    }

    /// Validate and build the definition.
    ///
    /// # Errors
    ///
    /// See [`ExperimentDefinition::validate`].
    pub fn build(self) -> Result<ExperimentDefinition> {
        self.definition.validate()?;
        Ok(self.definition)
    }
}
