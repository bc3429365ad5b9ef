//! Typed search configurations: search algorithm ∘ heuristic ∘ symmetry options

use serde::{Deserialize, Serialize};

use super::expr::{Arg, Expr};
use crate::{Error, Result};

/// Variable name used when the symmetry object is shared via `let`.
const SYMMETRY_VAR: &str = "sym";

/// Which states a symmetrical-lookups heuristic evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LookupMode {
    /// One symmetric state reached by a random walk of the given length
    OneState {
        /// Random-walk length
        rw_length: u32,
    },
    /// A subset of the symmetric states of the given size
    SubsetOfStates {
        /// Number of states
        states: u32,
    },
    /// Every symmetric state
    AllStates,
}

impl LookupMode {
    fn solver_name(self) -> &'static str {
        match self {
            Self::OneState { .. } => "one_state",
            Self::SubsetOfStates { .. } => "subset_of_states",
            Self::AllStates => "all_states",
        }
    }

    const fn parameter(self) -> Option<u32> {
        match self {
            Self::OneState { rw_length } => Some(rw_length),
            Self::SubsetOfStates { states } => Some(states),
            Self::AllStates => None,
        }
    }

    /// Nickname fragment, e.g. `lookups-one5`.
    #[must_use]
    pub fn nick(self) -> String {
        match self {
            Self::OneState { rw_length } => format!("lookups-one{rw_length}"),
            Self::SubsetOfStates { states } => format!("lookups-sub{states}"),
            Self::AllStates => "lookups-all".to_string(),
        }
    }
}

/// Symmetry-based pruning applied by the search itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSymmetries {
    /// Orbit search space
    Oss,
    /// Duplicate pruning via canonical states
    Dks,
}

impl SearchSymmetries {
    const fn name(self) -> &'static str {
        match self {
            Self::Oss => "oss",
            Self::Dks => "dks",
        }
    }
}

/// Structural symmetry options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symmetries {
    /// Time bound for symmetry computation (0 = unbounded)
    #[serde(default)]
    pub time_bound: u32,
    /// Lookup mode of the heuristic
    pub lookups: LookupMode,
    /// Search-level symmetry pruning, if any
    #[serde(default)]
    pub search_symmetries: Option<SearchSymmetries>,
}

impl Symmetries {
    /// Symmetries for lookups only, without search-level pruning.
    #[must_use]
    pub const fn lookups(lookups: LookupMode) -> Self {
        Self {
            time_bound: 0,
            lookups,
            search_symmetries: None,
        }
    }

    /// Add search-level pruning.
    #[must_use]
    pub const fn with_search(mut self, search: SearchSymmetries) -> Self {
        self.search_symmetries = Some(search);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.lookups.parameter() == Some(0) {
            return Err(Error::InvalidConfig(format!(
                "symmetrical lookups '{}' need a positive state count",
                self.lookups.solver_name()
            )));
        }
        Ok(())
    }

    fn to_expr(self) -> Expr {
        let mut args = vec![
            Arg::kw("time_bound", self.time_bound),
            Arg::kw("symmetrical_lookups", self.lookups.solver_name()),
        ];
        if let Some(n) = self.lookups.parameter() {
            args.push(Arg::kw("symmetry_rw_length_or_number_states", n));
        }
        if let Some(search) = self.search_symmetries {
            args.push(Arg::kw("search_symmetries", search.name()));
        }
        Expr::call("structural_symmetries", args)
    }
}

/// Merge-and-shrink abstraction heuristic with a bisimulation shrink
/// strategy and the stateless DFP-style merge strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAndShrink {
    /// Abstraction size limit
    pub max_states: u32,
    /// Shrink threshold before merging
    pub threshold_before_merge: u32,
    /// Whether to prune unreachable abstract states
    pub prune_unreachable_states: bool,
    /// Greedy bisimulation
    pub greedy_bisimulation: bool,
}

impl Default for MergeAndShrink {
    fn default() -> Self {
        Self {
            max_states: 50_000,
            threshold_before_merge: 1,
            prune_unreachable_states: false,
            greedy_bisimulation: false,
        }
    }
}

impl MergeAndShrink {
    fn to_expr(self) -> Expr {
        let scoring = Expr::list(vec![
            Expr::unit("goal_relevance"),
            Expr::unit("dfp"),
            Expr::call(
                "total_order",
                vec![
                    Arg::kw("atomic_ts_order", "reverse_level"),
                    Arg::kw("product_ts_order", "new_to_old"),
                    Arg::kw("atomic_before_product", false),
                ],
            ),
        ]);
        let merge_strategy = Expr::call(
            "merge_stateless",
            vec![Arg::kw(
                "merge_selector",
                Expr::call(
                    "score_based_filtering",
                    vec![Arg::kw("scoring_functions", scoring)],
                ),
            )],
        );
        Expr::call(
            "merge_and_shrink",
            vec![
                Arg::kw(
                    "shrink_strategy",
                    Expr::call(
                        "shrink_bisimulation",
                        vec![Arg::kw("greedy", self.greedy_bisimulation)],
                    ),
                ),
                Arg::kw("merge_strategy", merge_strategy),
                Arg::kw(
                    "label_reduction",
                    Expr::call(
                        "exact",
                        vec![
                            Arg::kw("before_shrinking", true),
                            Arg::kw("before_merging", false),
                        ],
                    ),
                ),
                Arg::kw("max_states", self.max_states),
                Arg::kw("threshold_before_merge", self.threshold_before_merge),
                Arg::kw("prune_unreachable_states", self.prune_unreachable_states),
            ],
        )
    }
}

/// Heuristic tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Heuristic {
    /// Merge-and-shrink
    MergeAndShrink(MergeAndShrink),
    /// iPDB pattern database heuristic
    Ipdb {
        /// Pattern generation time limit in seconds
        max_time: u32,
    },
    /// Maximizes a component heuristic over symmetric states
    SymmetricalLookups {
        /// Wrapped heuristic
        component: Box<Heuristic>,
        /// Symmetry object the lookups use
        symmetries: Symmetries,
    },
}

impl Heuristic {
    /// Wrap `component` in a symmetrical-lookups heuristic.
    #[must_use]
    pub fn with_lookups(component: Self, symmetries: Symmetries) -> Self {
        Self::SymmetricalLookups {
            component: Box::new(component),
            symmetries,
        }
    }

    /// Symmetry object, if this is a lookups heuristic.
    #[must_use]
    pub const fn symmetries(&self) -> Option<&Symmetries> {
        match self {
            Self::SymmetricalLookups { symmetries, .. } => Some(symmetries),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::MergeAndShrink(ms) if ms.max_states == 0 => Err(Error::InvalidConfig(
                "merge_and_shrink needs max_states > 0".to_string(),
            )),
            Self::MergeAndShrink(_) | Self::Ipdb { .. } => Ok(()),
            Self::SymmetricalLookups {
                component,
                symmetries,
            } => {
                if matches!(**component, Self::SymmetricalLookups { .. }) {
                    return Err(Error::InvalidConfig(
                        "symmetrical lookups cannot wrap another lookups heuristic".to_string(),
                    ));
                }
                symmetries.validate()?;
                component.validate()
            }
        }
    }

    fn component_nick(&self) -> &'static str {
        match self {
            Self::MergeAndShrink(_) => "ms",
            Self::Ipdb { .. } => "ipdb",
            Self::SymmetricalLookups { component, .. } => component.component_nick(),
        }
    }

    fn to_expr(&self, shared_symmetries: bool) -> Expr {
        match self {
            Self::MergeAndShrink(ms) => ms.to_expr(),
            Self::Ipdb { max_time } => Expr::call("ipdb", vec![Arg::kw("max_time", *max_time)]),
            Self::SymmetricalLookups {
                component,
                symmetries,
            } => {
                let symmetries = if shared_symmetries {
                    Expr::ident(SYMMETRY_VAR)
                } else {
                    symmetries.to_expr()
                };
                Expr::call(
                    "sl_heuristic",
                    vec![
                        Arg::kw("component_heuristic", component.to_expr(false)),
                        Arg::kw("symmetries", symmetries),
                    ],
                )
            }
        }
    }
}

/// Solver log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Only the final statistics
    #[default]
    Silent,
    /// Progress lines
    Normal,
    /// Everything
    Verbose,
}

impl Verbosity {
    const fn name(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Normal => "normal",
            Self::Verbose => "verbose",
        }
    }
}

/// Top-level search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum SearchAlgorithm {
    /// A* with the given heuristic
    Astar {
        /// Evaluator
        heuristic: Heuristic,
        /// Log verbosity
        #[serde(default)]
        verbosity: Verbosity,
    },
}

impl SearchAlgorithm {
    /// A* with silent logging.
    #[must_use]
    pub const fn astar(heuristic: Heuristic) -> Self {
        Self::Astar {
            heuristic,
            verbosity: Verbosity::Silent,
        }
    }

    /// Check structural constraints.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Astar { heuristic, .. } => heuristic.validate(),
        }
    }

    /// Canonical nickname derived from the configuration structure,
    /// e.g. `ipdb-dks-lookups-sub10` or `ms-oss-noprune-lookups-one5`.
    #[must_use]
    pub fn nick(&self) -> String {
        let Self::Astar { heuristic, .. } = self;
        let mut parts = vec![heuristic.component_nick().to_string()];
        if let Heuristic::SymmetricalLookups {
            component,
            symmetries,
        } = heuristic
        {
            if let Some(search) = symmetries.search_symmetries {
                parts.push(search.name().to_string());
                if let Heuristic::MergeAndShrink(ms) = **component {
                    if !ms.prune_unreachable_states {
                        parts.push("noprune".to_string());
                    }
                }
            }
            parts.push(symmetries.lookups.nick());
        }
        parts.join("-")
    }

    /// Render to the solver's option syntax.
    ///
    /// When the search itself prunes with symmetries, one symmetry object is
    /// bound with `let` and shared by the heuristic and the search.
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        let Self::Astar {
            heuristic,
            verbosity,
        } = self;
        let shared = heuristic
            .symmetries()
            .filter(|s| s.search_symmetries.is_some())
            .copied();
        let mut args = vec![Arg::pos(heuristic.to_expr(shared.is_some()))];
        if shared.is_some() {
            args.push(Arg::kw("symmetries", SYMMETRY_VAR));
        }
        args.push(Arg::kw("verbosity", verbosity.name()));
        let search = Expr::call("astar", args);
        match shared {
            Some(symmetries) => Expr::bind(SYMMETRY_VAR, symmetries.to_expr(), search),
            None => search,
        }
    }

    /// Solver command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        vec!["--search".to_string(), self.to_expr().to_string()]
    }
}
