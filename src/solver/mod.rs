//! Structured solver configurations
//!
//! Configurations are trees, not strings. A [`SearchAlgorithm`] validates
//! itself, derives a canonical nickname, and renders to the solver's nested
//! option syntax through the generic [`Expr`] tree:
//!
//! ```rust
//! use runlab::solver::{Heuristic, LookupMode, SearchAlgorithm, Symmetries};
//!
//! let search = SearchAlgorithm::astar(Heuristic::with_lookups(
//!     Heuristic::Ipdb { max_time: 900 },
//!     Symmetries::lookups(LookupMode::AllStates),
//! ));
//! assert_eq!(search.nick(), "ipdb-lookups-all");
//! assert_eq!(search.to_args()[0], "--search");
//! ```

mod expr;
mod search;

pub use expr::{Arg, Expr};
pub use search::{
    Heuristic, LookupMode, MergeAndShrink, SearchAlgorithm, SearchSymmetries, Symmetries,
    Verbosity,
};
