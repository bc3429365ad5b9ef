//! Ready-made parsers for planner logs with structural symmetries
//!
//! These are ordinary instances of the generic [`Parser`] contract; the core
//! defines no fixed metric vocabulary.

use super::{ratio, Parser};
use crate::properties::ValueType;
use crate::Result;

/// `(name, regex, value_type)` for the optional search-statistics fields.
const SEARCH_PATTERNS: &[(&str, &str, ValueType)] = &[
    ("expansions", r"Expanded (\d+) state\(s\)\.", ValueType::Int),
    ("reopened", r"Reopened (\d+) state\(s\)\.", ValueType::Int),
    ("evaluations", r"Evaluated (\d+) state\(s\)\.", ValueType::Int),
    ("generated", r"Generated (\d+) state\(s\)\.", ValueType::Int),
    ("dead_ends", r"Dead ends: (\d+) state\(s\)\.", ValueType::Int),
    (
        "expansions_until_last_jump",
        r"Expanded until last jump: (\d+) state\(s\)\.",
        ValueType::Int,
    ),
    (
        "reopened_until_last_jump",
        r"Reopened until last jump: (\d+) state\(s\)\.",
        ValueType::Int,
    ),
    (
        "evaluations_until_last_jump",
        r"Evaluated until last jump: (\d+) state\(s\)\.",
        ValueType::Int,
    ),
    (
        "generated_until_last_jump",
        r"Generated until last jump: (\d+) state\(s\)\.",
        ValueType::Int,
    ),
    ("search_time", r"Search time: ([0-9.]+)s", ValueType::Float),
    ("total_time", r"Total time: ([0-9.]+)s", ValueType::Float),
    ("cost", r"Plan cost: (\d+)", ValueType::Int),
    ("plan_length", r"Plan length: (\d+) step\(s\)\.", ValueType::Int),
];

/// `(name, regex, value_type)` for the optional symmetry fields.
const SYMMETRY_PATTERNS: &[(&str, &str, ValueType)] = &[
    (
        "symmetrical_states",
        r"Symmetrical states generated: (\d+)",
        ValueType::Int,
    ),
    (
        "improved_evaluations",
        r"Symmetry-improved evaluations: (\d+)",
        ValueType::Int,
    ),
    (
        "improving_states",
        r"Improving symmetrical states: (\d+)",
        ValueType::Int,
    ),
    (
        "last_jump_symmetrical_states",
        r"Symmetrical states generated until last jump: (\d+)",
        ValueType::Int,
    ),
    (
        "last_jump_improved_evaluations",
        r"Symmetry-improved evaluations until last jump: (\d+)",
        ValueType::Int,
    ),
    (
        "last_jump_improving_states",
        r"Improving symmetrical states until last jump: (\d+)",
        ValueType::Int,
    ),
    (
        "num_search_generators",
        r"Number of search generators \(affecting facts\): (\d+)",
        ValueType::Int,
    ),
    (
        "num_operator_generators",
        r"Number of identity generators \(on facts, not on operators\): (\d+)",
        ValueType::Int,
    ),
    (
        "num_total_generators",
        r"Total number of generators: (\d+)",
        ValueType::Int,
    ),
    (
        "symmetry_graph_size",
        r"Size of the grounded symmetry graph: (\d+)",
        ValueType::Int,
    ),
    (
        "time_symmetries",
        r"Done initializing symmetries: (.+)s",
        ValueType::Float,
    ),
    (
        "symmetry_group_order",
        r"Symmetry group order: (\d+)",
        ValueType::Int,
    ),
];

fn optional_patterns(table: &[(&str, &str, ValueType)]) -> Result<Parser> {
    let mut parser = Parser::new();
    for &(name, regex, value_type) in table {
        parser.add_pattern(name, regex, false, value_type)?;
    }
    Ok(parser)
}

/// Search statistics printed at the end of a search.
///
/// # Errors
///
/// Never in practice; the built-in patterns are valid.
pub fn search_parser() -> Result<Parser> {
    optional_patterns(SEARCH_PATTERNS)
}

/// Symmetry statistics plus the per-evaluation rates.
///
/// The rates divide by `evaluations` and `evaluations_until_last_jump`,
/// which [`search_parser`] provides; without them both rates are `0.0`.
///
/// # Errors
///
/// Never in practice; the built-in patterns are valid.
pub fn symmetry_parser() -> Result<Parser> {
    let mut parser = optional_patterns(SYMMETRY_PATTERNS)?;
    parser.add_function(ratio(
        "symmetrical_states_per_evaluation",
        "symmetrical_states",
        "evaluations",
    ));
    parser.add_function(ratio(
        "last_jump_symmetrical_states_per_evaluation",
        "last_jump_symmetrical_states",
        "evaluations_until_last_jump",
    ));
    Ok(parser)
}

/// [`search_parser`] followed by [`symmetry_parser`].
///
/// # Errors
///
/// Never in practice; the two pattern sets are disjoint.
pub fn default_parser() -> Result<Parser> {
    let mut parser = search_parser()?;
    parser.extend(symmetry_parser()?)?;
    Ok(parser)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Done initializing symmetries: 0.12s
Size of the grounded symmetry graph: 310
Number of search generators (affecting facts): 3
Number of identity generators (on facts, not on operators): 1
Total number of generators: 4
Symmetry group order: 48
Expanded 50 state(s).
Reopened 0 state(s).
Evaluated 40 state(s).
Evaluations: 40
Generated 200 state(s).
Dead ends: 2 state(s).
Symmetrical states generated: 120
Symmetry-improved evaluations: 7
Improving symmetrical states: 5
Expanded until last jump: 30 state(s).
Evaluated until last jump: 20 state(s).
Symmetrical states generated until last jump: 10 state(s).
Symmetry-improved evaluations until last jump: 2
Improving symmetrical states until last jump: 1
Plan length: 9 step(s).
Plan cost: 9
Search time: 0.5s
Total time: 0.75s
";

    #[test]
    fn test_default_parser_full_log() {
        let parser = default_parser().unwrap();
        let record = parser.parse(LOG).unwrap();

        assert_eq!(record.get_i64("symmetry_group_order"), Some(48));
        assert_eq!(record.get_i64("num_total_generators"), Some(4));
        assert_eq!(record.get_i64("num_operator_generators"), Some(1));
        assert_eq!(record.get_f64("time_symmetries"), Some(0.12));
        assert_eq!(record.get_i64("evaluations"), Some(40));
        assert_eq!(record.get_i64("symmetrical_states"), Some(120));
        assert_eq!(record.get_i64("last_jump_symmetrical_states"), Some(10));
        assert_eq!(record.get_f64("symmetrical_states_per_evaluation"), Some(3.0));
        assert_eq!(
            record.get_f64("last_jump_symmetrical_states_per_evaluation"),
            Some(0.5)
        );
        assert_eq!(record.get_f64("search_time"), Some(0.5));
        assert_eq!(record.get_f64("total_time"), Some(0.75));
        assert_eq!(record.get_i64("cost"), Some(9));
    }

    #[test]
    fn test_symmetry_parser_without_search_fields() {
        let parser = symmetry_parser().unwrap();
        let record = parser.parse("Symmetrical states generated: 120\n").unwrap();
        assert_eq!(record.get_f64("symmetrical_states_per_evaluation"), Some(0.0));
        assert_eq!(
            record.get_f64("last_jump_symmetrical_states_per_evaluation"),
            Some(0.0)
        );
        assert!(record.get("symmetry_group_order").is_none());
    }

    #[test]
    fn test_until_last_jump_lines_do_not_shadow_totals() {
        let parser = default_parser().unwrap();
        let record = parser
            .parse("Evaluated until last jump: 3 state(s).\nEvaluated 9 state(s).\n")
            .unwrap();
        assert_eq!(record.get_i64("evaluations"), Some(9));
        assert_eq!(record.get_i64("evaluations_until_last_jump"), Some(3));
    }

    #[test]
    fn test_times_found_without_trailing_newline() {
        let parser = search_parser().unwrap();
        let record = parser.parse("Search time: 0.5s\nTotal time: 0.75s").unwrap();
        assert_eq!(record.get_f64("search_time"), Some(0.5));
        assert_eq!(record.get_f64("total_time"), Some(0.75));

        let record = parser.parse("Search time: 1.25s\r\nTotal time: 2s\r\n").unwrap();
        assert_eq!(record.get_f64("search_time"), Some(1.25));
        assert_eq!(record.get_f64("total_time"), Some(2.0));
    }
}
