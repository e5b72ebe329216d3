use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use regression_runner::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regression-runner")]
#[command(about = "Run regression test suites as staged pipelines", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a test suite
    Run {
        /// Path to the suite YAML or JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to runner.yaml config file (default: runner.yaml next to FILE)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// How test cases are ordered (overrides config)
        #[arg(short, long, value_enum)]
        ordering: Option<CaseOrdering>,

        /// Default job timeout in milliseconds (overrides config)
        #[arg(short, long, value_name = "MS")]
        timeout: Option<u64>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a suite file without running it
    Validate {
        /// Path to the suite file
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// List the cases and compiled commands of a suite
    List {
        /// Path to the suite file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "regression_runner=debug"
    } else {
        "regression_runner=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Runner failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Run {
            file,
            config,
            ordering,
            timeout,
            json,
        } => run_suite(file, config, ordering, timeout, json).await,
        Commands::Validate { path } => validate(path),
        Commands::List { file } => list_suite(file),
    }
}

fn load_suite(file: &Path) -> anyhow::Result<TestSuite> {
    if !file.exists() {
        anyhow::bail!("Suite file not found: {}", file.display());
    }
    Ok(SuiteLoader::load_file(file)?)
}

fn load_config(file: &Path, config_path: Option<PathBuf>) -> anyhow::Result<RunnerConfig> {
    let explicit = config_path.is_some();
    let config_file = config_path.unwrap_or_else(|| {
        file.parent()
            .unwrap_or_else(|| Path::new("."))
            .join("runner.yaml")
    });

    if config_file.exists() {
        tracing::debug!(path = %config_file.display(), "Using runner config");
        Ok(RunnerConfig::load(&config_file)?)
    } else if explicit {
        anyhow::bail!("Config file not found: {}", config_file.display());
    } else {
        Ok(RunnerConfig::default())
    }
}

async fn run_suite(
    file: PathBuf,
    config_path: Option<PathBuf>,
    ordering: Option<CaseOrdering>,
    timeout: Option<u64>,
    json: bool,
) -> anyhow::Result<bool> {
    let suite = load_suite(&file)?;
    let mut config = load_config(&file, config_path)?;

    if let Some(ordering) = ordering {
        config.ordering = ordering;
    }
    if let Some(ms) = timeout {
        config.job_timeout = Some(ms);
    }

    let pipeline = suite.to_pipeline(config.ordering)?;
    let mut executor = PipelineExecutor::new(pipeline)
        .with_notifier(config.notifier()?)
        .with_options(config.executor_options());

    if !json {
        println!("Running suite: {} ({})\n", suite.name, file.display());
    }

    let report = executor.execute().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report.success)
}

fn list_suite(file: PathBuf) -> anyhow::Result<bool> {
    let suite = load_suite(&file)?;
    let pipeline = suite.to_pipeline(CaseOrdering::Independent)?;

    if pipeline.is_empty() {
        println!("No test cases in: {}", file.display());
        return Ok(true);
    }

    println!("Suite: {}\n", suite.name);
    for stage in pipeline.stages() {
        println!("  {} ({} jobs)", stage.name(), stage.jobs().len());
        for job in stage.jobs() {
            println!("    - {}: {}", job.name(), job.command_line());
        }
    }

    Ok(true)
}

fn validate(path: PathBuf) -> anyhow::Result<bool> {
    let suite = load_suite(&path)?;
    let pipeline = suite.to_pipeline(CaseOrdering::Independent)?;
    let order = pipeline.execution_order()?;

    let mut missing: Vec<String> = Vec::new();
    for action in suite.cases.iter().flat_map(|c| c.actions.iter()) {
        if let Some(interpreter) = action.script_kind.interpreter() {
            if which::which(interpreter).is_err() && !missing.iter().any(|m| m == interpreter) {
                missing.push(interpreter.to_string());
            }
        }
    }
    for interpreter in &missing {
        tracing::warn!(interpreter = %interpreter, "Interpreter not found in PATH");
        println!("! interpreter not found in PATH: {}", interpreter);
    }

    println!(
        "✓ {} is valid: {} cases, {} actions, {} scheduling passes",
        path.display(),
        suite.cases.len(),
        suite.action_count(),
        order.len()
    );

    Ok(true)
}

fn print_report(report: &PipelineReport) {
    println!("\n=== Pipeline Result ===\n");
    println!("Success: {}", if report.success { "YES" } else { "NO" });
    println!("Run ID: {}", report.run_id);
    println!("Jobs: {} total, {} failed\n", report.total, report.failed);

    for summary in &report.results {
        let status = if summary.success == "Yes" { "✓" } else { "✗" };
        println!(
            "{} {} [{}] {}",
            status, summary.job_name, summary.execution_time, summary.command
        );
        if summary.success != "Yes" && !summary.stderr.is_empty() {
            for line in summary.stderr.lines() {
                println!("      {}", line);
            }
        }
    }
}
