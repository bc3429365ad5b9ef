//! Property-based tests for runlab
//!
//! - Test registry and grid invariants
//! - Test merge/pair invariants over generated batches
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use runlab::experiment::{merge, pair, AlgorithmPairing, BatchEntry, ExperimentBatch, MergeMode};
use runlab::grid::{build_grid, AlgorithmConfig, TaskRef};
use runlab::parser::{ratio, Parser};
use runlab::properties::{PropertyRecord, ValueType};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Field names like `f_ab3`
fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

/// Distinct nicks, revisions and task ids
fn arb_grid_axes() -> impl Strategy<Value = (Vec<String>, Vec<String>, Vec<String>)> {
    (
        proptest::collection::btree_set("r[0-9]{1,3}", 1..4),
        proptest::collection::btree_set("[a-z]{1,6}", 1..5),
        proptest::collection::btree_set("p[0-9]{1,3}", 0..6),
    )
        .prop_map(|(revisions, nicks, problems)| {
            (
                revisions.into_iter().collect(),
                nicks.into_iter().collect(),
                problems.into_iter().collect(),
            )
        })
}

/// Batch with one entry per (run, task), run names drawn from `names`
fn arb_batch(name: &'static str, names: &'static [&'static str]) -> impl Strategy<Value = ExperimentBatch> {
    proptest::collection::btree_map(
        (proptest::sample::select(names), "t[0-9]{1,2}"),
        0i64..1000,
        0..20,
    )
    .prop_map(move |cells| {
        ExperimentBatch::from_entries(
            name,
            cells.into_iter().map(|((run, task), cost)| {
                BatchEntry::parsed(run, task, PropertyRecord::new().with("cost", cost))
            }),
        )
        .unwrap()
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Registry Properties
    // ========================================================================

    /// Property: registering a name twice always fails and leaves the registry unchanged
    #[test]
    fn prop_duplicate_pattern_always_rejected(name in arb_field_name(), required in any::<bool>()) {
        let mut parser = Parser::new();
        parser.add_pattern(&name, r"x=(\d+)", false, ValueType::Int).unwrap();
        let result = parser.add_pattern(&name, r"y=(\d+)", required, ValueType::Float);
        prop_assert!(matches!(result, Err(runlab::Error::DuplicateField(_))));
        prop_assert_eq!(parser.patterns().len(), 1);
    }

    /// Property: optional patterns that never match leave no field behind
    #[test]
    fn prop_unmatched_optional_fields_absent(text in "[A-Z ]{0,40}") {
        let mut parser = Parser::new();
        parser.add_pattern("cost", r"cost=(\d+)", false, ValueType::Int).unwrap();
        parser.add_pattern("time", r"time=([0-9.]+)", false, ValueType::Float).unwrap();
        let record = parser.parse(&text).unwrap();
        prop_assert!(record.is_empty());
    }

    /// Property: extracted ints equal the printed number
    #[test]
    fn prop_int_extraction_exact(n in 0i64..i64::MAX, prefix in "[a-z ]{0,20}") {
        let mut parser = Parser::new();
        parser.add_pattern("order", r"Symmetry group order: (\d+)", true, ValueType::Int).unwrap();
        let record = parser.parse(&format!("{prefix}\nSymmetry group order: {n}\n")).unwrap();
        prop_assert_eq!(record.get_i64("order"), Some(n));
    }

    /// Property: the guarded rate is num/den when both are positive, else 0
    #[test]
    fn prop_ratio_guarded(num in proptest::option::of(0i64..10_000), den in proptest::option::of(0i64..10_000)) {
        let mut parser = Parser::new();
        parser.add_pattern("num", r"num=(\d+)", false, ValueType::Int).unwrap();
        parser.add_pattern("den", r"den=(\d+)", false, ValueType::Int).unwrap();
        parser.add_function(ratio("rate", "num", "den"));

        let mut text = String::new();
        if let Some(num) = num {
            text.push_str(&format!("num={num}\n"));
        }
        if let Some(den) = den {
            text.push_str(&format!("den={den}\n"));
        }
        let rate = parser.parse(&text).unwrap().get_f64("rate").unwrap();
        #[allow(clippy::cast_precision_loss)]
        let expected = match (num, den) {
            (Some(n), Some(d)) if n != 0 && d != 0 => n as f64 / d as f64,
            _ => 0.0,
        };
        prop_assert!((rate - expected).abs() < 1e-12);
    }

    // ========================================================================
    // Grid Properties
    // ========================================================================

    /// Property: grid size is revisions × configs × tasks, all keys distinct
    #[test]
    fn prop_grid_size_and_unique_keys((revisions, nicks, problems) in arb_grid_axes()) {
        let configs: Vec<AlgorithmConfig> =
            nicks.iter().map(|n| AlgorithmConfig::raw(n.clone(), vec![])).collect();
        let tasks: Vec<TaskRef> = problems.iter().map(|p| TaskRef::new("d", p.clone())).collect();
        let runs = build_grid(&revisions, &configs, &tasks).unwrap();
        prop_assert_eq!(runs.len(), revisions.len() * configs.len() * tasks.len());

        let mut keys: Vec<_> = runs.iter().map(runlab::grid::RunSpec::key).collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), runs.len());
    }

    // ========================================================================
    // Merge / Pair Properties
    // ========================================================================

    /// Property: strict merge of disjoint batches keeps every entry
    #[test]
    fn prop_strict_merge_disjoint(
        a in arb_batch("a", &["r1-x", "r1-y"]),
        b in arb_batch("b", &["r2-x", "r2-y"]),
    ) {
        let merged = merge(&[a.clone(), b.clone()], MergeMode::Strict).unwrap();
        prop_assert_eq!(merged.len(), a.len() + b.len());
        for entry in a.entries().iter().chain(b.entries()) {
            prop_assert_eq!(merged.get(&entry.key.run_name, &entry.key.task_id), Some(entry));
        }
    }

    /// Property: overlay keeps exactly the later batch's entries for shared runs
    #[test]
    fn prop_overlay_later_wins(
        a in arb_batch("a", &["r1-x", "r1-y"]),
        b in arb_batch("b", &["r1-x"]),
    ) {
        let merged = merge(&[a.clone(), b.clone()], MergeMode::Overlay).unwrap();
        if b.contains_run("r1-x") {
            prop_assert_eq!(merged.runs("r1-x").count(), b.runs("r1-x").count());
            for entry in b.entries() {
                prop_assert_eq!(merged.get(&entry.key.run_name, &entry.key.task_id), Some(entry));
            }
        }
        prop_assert_eq!(merged.runs("r1-y").count(), a.runs("r1-y").count());
    }

    /// Property: paired rows never exceed the tasks of either side
    #[test]
    fn prop_pair_bounded(
        a in arb_batch("a", &["old-x"]),
        b in arb_batch("b", &["new-x"]),
    ) {
        prop_assume!(!a.is_empty() && !b.is_empty());
        let rows = pair(&a, &b, &AlgorithmPairing::revisions("old", "new", ["x"])).unwrap();
        prop_assert!(rows.len() <= a.len().min(b.len()));
    }
}
