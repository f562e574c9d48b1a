//! Crucible CLI
//!
//! Compares recorded experiment runs and scores them locally from a runs file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crucible::{
    builtin_cases, evaluate_run, feedback_stats, generate_report, load_cases_from_dir,
    print_comparison, Comparator, InMemoryBackend, Judge, RunStore, StoredRun, TestCase,
};

#[derive(Parser)]
#[command(name = "crucible")]
#[command(about = "Evaluation harness for comparing agent experiment runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory containing TOML test-case files (or set CRUCIBLE_CASES env var)
    #[arg(long)]
    cases_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare experiments from a recorded-runs file
    Compare {
        /// Path to a JSON file mapping experiment names to their runs
        #[arg(short, long)]
        runs: PathBuf,

        /// Experiment names to compare (defaults to every experiment in the file)
        experiments: Vec<String>,

        /// Restrict the comparison to these metric keys
        #[arg(short, long, value_delimiter = ',')]
        metrics: Vec<String>,

        /// Write a markdown report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List test cases and the dataset composition
    Cases,

    /// Score one experiment's runs with the deterministic and performance tiers
    Evaluate {
        /// Path to a JSON file mapping experiment names to their runs
        #[arg(short, long)]
        runs: PathBuf,

        /// Experiment to evaluate
        experiment: String,

        /// Include the model-judged tier (requires judge credentials)
        #[arg(long)]
        judged: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let cases_dir = cli
        .cases_dir
        .or_else(|| std::env::var("CRUCIBLE_CASES").ok().map(PathBuf::from));

    match cli.command {
        Commands::Compare {
            runs,
            experiments,
            metrics,
            report,
        } => run_compare(&runs, experiments, metrics, report.as_deref()).await,
        Commands::Cases => {
            list_cases(cases_dir.as_deref())?;
            Ok(())
        }
        Commands::Evaluate {
            runs,
            experiment,
            judged,
        } => run_evaluate(&runs, &experiment, cases_dir.as_deref(), judged).await,
    }
}

/// Load a runs file into the in-memory backend.
async fn load_runs(path: &Path) -> Result<Arc<InMemoryBackend>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read runs file: {}", path.display()))?;
    let by_experiment: HashMap<String, Vec<StoredRun>> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse runs file: {}", path.display()))?;

    let backend = Arc::new(InMemoryBackend::new());
    for (experiment, runs) in by_experiment {
        for run in runs {
            backend.record_run(&experiment, run).await;
        }
    }
    Ok(backend)
}

/// Load cases from the given directory, falling back to the built-in set.
fn get_cases(cases_dir: Option<&Path>) -> Result<Vec<TestCase>> {
    match cases_dir {
        Some(dir) => {
            println!("Loading cases from: {}", dir.display());
            let cases = load_cases_from_dir(dir)?;
            if cases.is_empty() {
                println!("No cases found in directory, using built-in cases");
                return Ok(builtin_cases());
            }
            Ok(cases)
        }
        None => Ok(builtin_cases()),
    }
}

async fn run_compare(
    runs_path: &Path,
    experiments: Vec<String>,
    metrics: Vec<String>,
    report_path: Option<&Path>,
) -> Result<()> {
    let backend = load_runs(runs_path).await?;

    let experiments = if experiments.is_empty() {
        backend.experiment_names().await
    } else {
        experiments
    };
    let metrics = if metrics.is_empty() {
        None
    } else {
        Some(metrics.as_slice())
    };

    let comparator = Comparator::new(backend);
    let aggregation = comparator.compare(&experiments, metrics).await?;

    print_comparison(&aggregation);

    if let Some(path) = report_path {
        generate_report(&aggregation, Some(path))?;
        println!("\nReport saved to: {}", path.display());
    }

    Ok(())
}

fn list_cases(cases_dir: Option<&Path>) -> Result<()> {
    let cases = get_cases(cases_dir)?;

    println!("Available cases:\n");
    for case in &cases {
        println!("  {} ({})", case.name, case.category.as_str());
    }
    println!();
    crucible::dataset::print_composition(&cases);

    Ok(())
}

async fn run_evaluate(
    runs_path: &Path,
    experiment: &str,
    cases_dir: Option<&Path>,
    judged: bool,
) -> Result<()> {
    let backend = load_runs(runs_path).await?;
    let runs = backend.fetch_root_runs(experiment).await?;
    if runs.is_empty() {
        anyhow::bail!("No runs found for experiment '{}'", experiment);
    }

    let cases = get_cases(cases_dir)?;
    let by_name: HashMap<&str, &TestCase> =
        cases.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut evaluators = crucible::automated_evaluators();
    evaluators.extend(crucible::performance_evaluators());
    if judged {
        let client = llm::LlmClient::from_env().context("Failed to create judge client")?;
        let judge = Arc::new(Judge::new(Arc::new(client)));
        evaluators.extend(crucible::judge_evaluators(judge));
    }

    println!(
        "Evaluating {} run(s) for '{}' with {} evaluator(s)\n",
        runs.len(),
        experiment,
        evaluators.len()
    );

    for (i, stored) in runs.iter().enumerate() {
        let case_name = stored.case.as_deref().unwrap_or("(no case)");
        println!("--- Run {} [{}] ---", i + 1, case_name);

        let expected = stored
            .case
            .as_deref()
            .and_then(|name| by_name.get(name))
            .map(|case| case.expected.clone())
            .unwrap_or_default();

        let results = evaluate_run(&evaluators, &stored.run, &expected).await;
        for result in &results {
            println!("  {:<25} {:>6.3}  {}", result.key, result.score, result.comment);
        }

        let stats = feedback_stats(&results);
        let total: f64 = stats.values().map(|s| s.avg).sum();
        println!("  {:<25} {:>6.3}", "(total)", total);
        println!();
    }

    Ok(())
}
