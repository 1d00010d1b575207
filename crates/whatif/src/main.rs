use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use whatif_core::analysis::{ClusterConfig, ScoreConfig, cluster_outcomes, score_inputs};
use whatif_core::evaluator::{BatchConfig, BatchResult, run_experiments};
use whatif_core::model::{ExperimentDesign, ResultTable};
use whatif_core::sampling::{self, SampleOptions};

mod dike;
mod logging;
mod observer;
mod report;

use dike::DikeModel;
use logging::init_logging;
use observer::LogObserver;
use report::JsonReport;

#[derive(Parser, Debug)]
#[command(name = "whatif")]
#[command(about = "Exploratory experiment runner for a dike-ring flood model")]
struct Cli {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run sampled scenarios against the do-nothing policy and summarize outcomes
    Baseline {
        /// Number of sampled scenarios
        #[arg(short = 'n', long, default_value_t = 50)]
        scenarios: usize,

        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Cluster runs by outcome to find regions of the space that behave alike
    Discover {
        /// Number of sampled scenarios
        #[arg(short = 'n', long, default_value_t = 100)]
        scenarios: usize,

        /// Number of sampled policies
        #[arg(short = 'p', long, default_value_t = 4)]
        policies: usize,

        /// Number of clusters
        #[arg(short, long, default_value_t = 3)]
        k: usize,

        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Rank inputs by how strongly they drive each outcome
    Rank {
        /// Number of sampled scenarios
        #[arg(short = 'n', long, default_value_t = 500)]
        scenarios: usize,

        /// Number of sampled policies
        #[arg(short = 'p', long, default_value_t = 4)]
        policies: usize,

        /// Trees per outcome in the scoring forest
        #[arg(long, default_value_t = 100)]
        trees: usize,

        #[command(flatten)]
        batch: BatchArgs,
    },
}

/// Options shared by every experiment batch
#[derive(Args, Debug)]
struct BatchArgs {
    /// Seed for sampling and run replication; a fixed seed reproduces the
    /// full study
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Worker threads (default: all available cores)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-run timeout in seconds; omit for no timeout
    #[arg(long, value_name = "SECS")]
    run_timeout_secs: Option<u64>,

    /// Halt dispatch once the failed fraction of the design exceeds this
    /// ratio
    #[arg(long, default_value_t = 1.0)]
    max_failure_ratio: f64,

    /// Write the full result table as CSV
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write the full result table, plus any analyses, as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let model = DikeModel::new();
    match cli.command {
        Command::Baseline { scenarios, batch } => baseline(&model, scenarios, &batch),
        Command::Discover {
            scenarios,
            policies,
            k,
            batch,
        } => discover(&model, scenarios, policies, k, &batch),
        Command::Rank {
            scenarios,
            policies,
            trees,
            batch,
        } => rank(&model, scenarios, policies, trees, &batch),
    }
}

fn baseline(model: &DikeModel, scenarios: usize, args: &BatchArgs) -> color_eyre::Result<()> {
    let result = run_study(model, scenarios, None, args)?;

    print!("{}", report::render_summary(&result.table, &result.stats));

    write_exports(args, &result.table, &JsonReport::new(&result.table))
}

fn discover(
    model: &DikeModel,
    scenarios: usize,
    policies: usize,
    k: usize,
    args: &BatchArgs,
) -> color_eyre::Result<()> {
    let result = run_study(model, scenarios, Some(policies), args)?;

    let outcome_columns: Vec<&str> = result
        .table
        .outcome_columns()
        .iter()
        .map(String::as_str)
        .collect();
    let config = ClusterConfig {
        k,
        seed: args.seed,
        ..ClusterConfig::default()
    };
    let assignment = cluster_outcomes(&result.table, &outcome_columns, &config)?;

    print!("{}", report::render_summary(&result.table, &result.stats));
    println!();
    print!("{}", report::render_clusters(&assignment));

    write_exports(
        args,
        &result.table,
        &JsonReport::new(&result.table).with_clusters(&assignment),
    )
}

fn rank(
    model: &DikeModel,
    scenarios: usize,
    policies: usize,
    trees: usize,
    args: &BatchArgs,
) -> color_eyre::Result<()> {
    let result = run_study(model, scenarios, Some(policies), args)?;

    let input_columns: Vec<&str> = result
        .table
        .dimensions()
        .iter()
        .map(|d| d.name())
        .collect();
    let outcome_columns: Vec<&str> = result
        .table
        .outcome_columns()
        .iter()
        .map(String::as_str)
        .collect();
    let config = ScoreConfig {
        trees,
        seed: args.seed,
        ..ScoreConfig::default()
    };
    let matrix = score_inputs(&result.table, &input_columns, &outcome_columns, &config)?;

    print!("{}", report::render_summary(&result.table, &result.stats));
    println!();
    print!("{}", report::render_scores(&matrix));

    write_exports(
        args,
        &result.table,
        &JsonReport::new(&result.table).with_scores(&matrix),
    )
}

/// Sample the design and execute the batch. `policies: None` pins every
/// lever to the do-nothing reference policy.
fn run_study(
    model: &DikeModel,
    scenarios: usize,
    policies: Option<usize>,
    args: &BatchArgs,
) -> color_eyre::Result<BatchResult> {
    // Scenario and policy sampling get separate streams so their draws stay
    // independent under one study seed.
    let scenario_options = SampleOptions::seeded(args.seed);
    let policy_options = SampleOptions::seeded(args.seed.wrapping_add(1));

    let sampled_scenarios = sampling::sample_uncertainties(model, scenarios, &scenario_options)?;
    let sampled_policies = match policies {
        Some(n) => sampling::sample_levers(model, n, &policy_options)?,
        None => vec![sampling::reference_policy(model, "do_nothing", &[])?],
    };
    let design = ExperimentDesign::build(model, sampled_scenarios, sampled_policies)?;

    let mut config = BatchConfig {
        base_seed: args.seed,
        run_timeout: args.run_timeout_secs.map(Duration::from_secs),
        max_failure_ratio: args.max_failure_ratio,
        ..BatchConfig::default()
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    tracing::info!(
        runs = design.len(),
        workers = config.workers,
        seed = args.seed,
        "Starting batch"
    );
    let observer = LogObserver::new(design.len());
    let result = run_experiments(model, &design, &config, Some(&observer))?;

    for warning in &result.warnings {
        tracing::warn!("{warning}");
    }
    Ok(result)
}

fn write_exports(
    args: &BatchArgs,
    table: &ResultTable,
    json_report: &JsonReport<'_>,
) -> color_eyre::Result<()> {
    if let Some(path) = &args.csv {
        report::write_csv(table, path)?;
        tracing::info!(path = %path.display(), "Result table written");
    }
    if let Some(path) = &args.json {
        report::write_json(json_report, path)?;
        tracing::info!(path = %path.display(), "JSON report written");
    }
    Ok(())
}
