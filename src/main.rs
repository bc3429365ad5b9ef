use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use runlab::compare::compare;
use runlab::exec::{Executor, LocalExecutor};
use runlab::experiment::{
    merge, process_outputs, ExitCodePolicy, ExperimentBatch, ExperimentDefinition, MergeMode,
    RunOutput,
};
use runlab::grid::GridMode;
use runlab::parser::{self, presets};

#[derive(Parser)]
#[command(name = "runlab", version, about = "Solver benchmark experiments: grids, parsing, aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetArg {
    #[value(name = "default")]
    Default,
    #[value(name = "search")]
    Search,
    #[value(name = "symmetry")]
    Symmetry,
}

impl PresetArg {
    fn parser(self) -> runlab::Result<parser::Parser> {
        match self {
            Self::Default => presets::default_parser(),
            Self::Search => presets::search_parser(),
            Self::Symmetry => presets::symmetry_parser(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the run grid of an experiment definition
    Grid {
        definition: PathBuf,
        /// Build the smoke grid (test revisions and test suite)
        #[arg(long)]
        test_run: bool,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Parse one log file into a property record
    Parse {
        log: PathBuf,
        #[arg(long, value_enum, default_value = "default")]
        preset: PresetArg,
    },
    /// Execute an experiment locally and write the parsed batch
    Run {
        definition: PathBuf,
        /// Solver binary: `PATH` (may contain `{revision}`) or `REV=PATH`, repeatable
        #[arg(long, required = true)]
        solver: Vec<String>,
        #[arg(long)]
        benchmarks: PathBuf,
        #[arg(long, default_value_t = 1)]
        processes: usize,
        #[arg(long)]
        test_run: bool,
        #[arg(long, value_enum, default_value = "default")]
        preset: PresetArg,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Parse previously collected run outputs (JSON list) into a batch
    Process {
        outputs: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum, default_value = "default")]
        preset: PresetArg,
        /// Only parse runs that exited with one of these codes
        #[arg(long = "require-exit-code", value_delimiter = ',')]
        require_exit_code: Vec<i32>,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Merge batches by run name
    Merge {
        #[arg(required = true)]
        batches: Vec<PathBuf>,
        /// Let later batches replace runs of earlier ones
        #[arg(long)]
        overlay: bool,
        /// Keep only these run names
        #[arg(long = "filter-algorithm")]
        filter_algorithm: Vec<String>,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Compare two batches using a comparison declared in a definition
    Compare {
        definition: PathBuf,
        comparison: String,
        batch_a: PathBuf,
        batch_b: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run_command(cli.command)
}

fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Grid {
            definition,
            test_run,
            output,
        } => {
            let definition = load_definition(&definition)?;
            let runs = definition.grid(grid_mode(test_run))?;
            emit(&runs, output.as_deref())
        }
        Commands::Parse { log, preset } => {
            let text = fs::read_to_string(&log)
                .with_context(|| format!("failed to read {}", log.display()))?;
            let record = preset.parser()?.parse(&text)?;
            emit(&record, None)
        }
        Commands::Run {
            definition,
            solver,
            benchmarks,
            processes,
            test_run,
            preset,
            output,
        } => {
            let definition = load_definition(&definition)?;
            let runs = definition.grid(grid_mode(test_run))?;
            let executor = local_executor(&solver, benchmarks)?.with_processes(processes);
            executor.check_revisions(&runs)?;
            let outputs = executor.execute_all(&runs);
            let parser = preset.parser()?;
            let (batch, report) = process_outputs(
                definition.name(),
                &parser,
                &outputs,
                definition.exit_code_policy(),
            )?;
            eprint!("{report}");
            emit(&batch, output.as_deref())
        }
        Commands::Process {
            outputs,
            name,
            preset,
            require_exit_code,
            output,
        } => {
            let text = fs::read_to_string(&outputs)
                .with_context(|| format!("failed to read {}", outputs.display()))?;
            let outputs: Vec<RunOutput> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a list of run outputs", outputs.display()))?;
            let policy = if require_exit_code.is_empty() {
                ExitCodePolicy::AlwaysParse
            } else {
                ExitCodePolicy::RequireExitCode(require_exit_code)
            };
            let parser = preset.parser()?;
            let (batch, report) = process_outputs(name, &parser, &outputs, &policy)?;
            eprint!("{report}");
            emit(&batch, output.as_deref())
        }
        Commands::Merge {
            batches,
            overlay,
            filter_algorithm,
            output,
        } => {
            let batches = batches
                .iter()
                .map(|path| load_batch(path))
                .collect::<Result<Vec<_>>>()?;
            let mode = if overlay {
                MergeMode::Overlay
            } else {
                MergeMode::Strict
            };
            let mut merged = merge(&batches, mode)?;
            if !filter_algorithm.is_empty() {
                merged = merged.filter_algorithms(&filter_algorithm);
            }
            emit(&merged, output.as_deref())
        }
        Commands::Compare {
            definition,
            comparison,
            batch_a,
            batch_b,
            output,
        } => {
            let definition = load_definition(&definition)?;
            let Some(spec) = definition.comparison(&comparison) else {
                bail!(
                    "experiment '{}' declares no comparison '{comparison}'",
                    definition.name()
                );
            };
            let rows = compare(
                &load_batch(&batch_a)?,
                &load_batch(&batch_b)?,
                &definition.pairing(spec),
                definition.attributes(),
            )?;
            emit(&rows, output.as_deref())
        }
    }
}

const fn grid_mode(test_run: bool) -> GridMode {
    if test_run {
        GridMode::Smoke
    } else {
        GridMode::Full
    }
}

/// Build the executor from `--solver` values.
fn local_executor(solvers: &[String], benchmarks: PathBuf) -> Result<LocalExecutor> {
    let mut default: Option<&str> = None;
    let mut mapped = Vec::new();
    for value in solvers {
        match value.split_once('=') {
            Some((revision, path)) if !revision.is_empty() => mapped.push((revision, path)),
            _ => {
                if default.replace(value.as_str()).is_some() {
                    bail!("more than one default --solver given");
                }
            }
        }
    }
    let executor = LocalExecutor::new(default.unwrap_or_default(), benchmarks);
    Ok(mapped
        .into_iter()
        .fold(executor, |executor, (revision, path)| {
            executor.with_revision_solver(revision, path)
        }))
}

fn load_definition(path: &Path) -> Result<ExperimentDefinition> {
    ExperimentDefinition::from_json_file(path)
        .with_context(|| format!("failed to load experiment definition {}", path.display()))
}

fn load_batch(path: &Path) -> Result<ExperimentBatch> {
    ExperimentBatch::load_json(path)
        .with_context(|| format!("failed to load batch {}", path.display()))
}

/// Pretty JSON to `path`, or to stdout.
fn emit<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}
