//! Symmetric-lookups study: heuristic lookups over symmetric states, alone and
//! combined with orbit search (OSS) or DKS pruning.
//!
//! Builds the experiment as data, runs the smoke grid through a simulated
//! executor, then merges with an older batch and compares both revisions.
//!
//! Run with: `cargo run --example symmetric_lookups`

use runlab::compare::{compare, Aggregate, Attribute};
use runlab::exec::Executor;
use runlab::experiment::{
    merge, process_outputs, ComparisonSpec, ExperimentDefinition, MergeMode, RunOutput,
};
use runlab::grid::{AlgorithmConfig, GridMode, RunSpec, TaskRef};
use runlab::parser::presets;
use runlab::solver::{
    Heuristic, LookupMode, MergeAndShrink, SearchAlgorithm, SearchSymmetries, Symmetries,
};

const OLD_REVISION: &str = "b142bad5";
const REVISION: &str = "d9098cdd";

fn lookup_modes() -> [LookupMode; 3] {
    [
        LookupMode::OneState { rw_length: 5 },
        LookupMode::SubsetOfStates { states: 10 },
        LookupMode::AllStates,
    ]
}

fn configs() -> Vec<AlgorithmConfig> {
    let components = [
        Heuristic::MergeAndShrink(MergeAndShrink::default()),
        Heuristic::Ipdb { max_time: 900 },
    ];
    let mut configs = Vec::new();
    for component in &components {
        for mode in lookup_modes() {
            let search = SearchAlgorithm::astar(Heuristic::with_lookups(
                component.clone(),
                Symmetries::lookups(mode),
            ));
            configs.push(AlgorithmConfig::structured(search));
        }
    }
    let searches = [
        (Heuristic::MergeAndShrink(MergeAndShrink::default()), SearchSymmetries::Oss),
        (Heuristic::Ipdb { max_time: 900 }, SearchSymmetries::Oss),
        (Heuristic::Ipdb { max_time: 900 }, SearchSymmetries::Dks),
    ];
    for (component, pruning) in &searches {
        for mode in lookup_modes() {
            let search = SearchAlgorithm::astar(Heuristic::with_lookups(
                component.clone(),
                Symmetries::lookups(mode).with_search(*pruning),
            ));
            configs.push(AlgorithmConfig::structured(search));
        }
    }
    configs
}

fn attributes() -> Vec<Attribute> {
    vec![
        Attribute::new("num_total_generators").absolute().max_wins(),
        Attribute::new("symmetry_graph_size").absolute(),
        Attribute::new("time_symmetries").aggregate(Aggregate::GeometricMean),
        Attribute::new("symmetry_group_order").absolute().max_wins(),
        Attribute::new("symmetrical_states").max_wins(),
        Attribute::new("symmetrical_states_per_evaluation")
            .max_wins()
            .aggregate(Aggregate::ArithmeticMean),
        Attribute::new("expansions"),
    ]
}

/// Pretends to run the planner; output size depends on the run.
fn simulated_planner(run: &RunSpec) -> RunOutput {
    let seed = run.run_name().len() + run.task().problem().len();
    if run.config_nick().starts_with("ms-oss") && run.task().problem() == "prob02.pddl" {
        return RunOutput::missing(run.key());
    }
    let text = format!(
        "Done initializing symmetries: 0.{seed}s\n\
         Total number of generators: 4\n\
         Symmetry group order: 48\n\
         Expanded {} state(s).\n\
         Evaluated {} state(s).\n\
         Symmetrical states generated: {}\n\
         Plan cost: 11\n",
        seed * 10,
        seed * 4,
        seed * 8,
    );
    RunOutput::finished(run.key(), text, 0)
}

fn main() -> runlab::Result<()> {
    let definition = configs()
        .into_iter()
        .fold(ExperimentDefinition::builder("sl-oss-dks"), |builder, config| {
            builder.config(config)
        })
        .revision(OLD_REVISION)
        .revision(REVISION)
        .test_revisions(vec![OLD_REVISION.to_string(), REVISION.to_string()])
        .suite(vec![TaskRef::new("gripper", "prob01.pddl")])
        .test_suite(vec![
            TaskRef::new("gripper", "prob01.pddl"),
            TaskRef::new("gripper", "prob02.pddl"),
        ])
        .comparison(ComparisonSpec {
            name: "compare-ipdb".to_string(),
            old_revision: OLD_REVISION.to_string(),
            new_revision: REVISION.to_string(),
            nick_prefix: Some("ipdb-".to_string()),
        })
        .attribute(Attribute::new("cost"))
        .build()?;

    println!("=== Configurations ===");
    for config in definition.configs() {
        println!("  {}", config.nick());
    }

    let grid = definition.grid(GridMode::Smoke)?;
    println!("\n=== Smoke grid: {} runs ===", grid.len());

    let parser = presets::default_parser()?;
    let (old_runs, new_runs): (Vec<RunSpec>, Vec<RunSpec>) =
        grid.into_iter().partition(|run| run.revision() == OLD_REVISION);

    let executor = simulated_planner;
    let (old_batch, old_report) = process_outputs(
        OLD_REVISION,
        &parser,
        &executor.execute_all(&old_runs),
        definition.exit_code_policy(),
    )?;
    let (new_batch, new_report) = process_outputs(
        REVISION,
        &parser,
        &executor.execute_all(&new_runs),
        definition.exit_code_policy(),
    )?;
    print!("{old_report}{new_report}");

    let merged = merge(&[old_batch.clone(), new_batch.clone()], MergeMode::Strict)?;
    println!("\nMerged batch '{}': {} entries", merged.name(), merged.len());

    let Some(comparison) = definition.comparison("compare-ipdb") else {
        return Ok(());
    };
    let rows = compare(
        &old_batch,
        &new_batch,
        &definition.pairing(comparison),
        &attributes(),
    )?;
    println!("\n=== {} ===", comparison.name);
    for row in rows.iter().filter(|row| row.attribute == "symmetrical_states") {
        println!(
            "  {:<28} {:>10?} {:>10?} diff {:?}",
            row.name_b, row.value_a, row.value_b, row.diff
        );
    }

    Ok(())
}
