#![warn(missing_docs)]
//! FloorBench CLI Library
//!
//! CLI infrastructure for the floorbench binary: argument parsing,
//! `floorbench.toml` discovery, suite execution (in-process or in isolated
//! worker processes), and report generation.

mod config;
mod executor;
mod supervisor;
mod worker;

pub use config::{FloorConfig, OutputConfig, RunnerConfig};
pub use executor::{Executor, IsolatedExecutor, ProbeFailure, ProbeOutcome};
pub use supervisor::{IpcProbeStatus, SupervisorError, WorkerHandle};
pub use worker::WorkerMain;

use clap::Parser;
use floorbench_core::{Probe, SuiteConfig, TimeUnit};
use floorbench_probes::PROBE_NAMES;
use floorbench_report::{
    build_report_meta, generate_human_report, generate_json_report, OutputFormat, Report,
};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// FloorBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "floorbench")]
#[command(author, version, about = "FloorBench - latency-floor micro-benchmark harness")]
pub struct Cli {
    /// Filter probes by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Output format: json, human
    #[arg(long, default_value = "human")]
    pub format: String,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Warmup batches per probe (discarded)
    #[arg(long, default_value = "3")]
    pub warmup: u32,

    /// Minimum wall-clock window of each warmup batch (e.g., "1s", "250ms")
    #[arg(long, default_value = "1s")]
    pub warmup_window: String,

    /// Measured batches per probe
    #[arg(long, default_value = "5")]
    pub measure: u32,

    /// Minimum wall-clock window of each measured batch (e.g., "1s", "250ms")
    #[arg(long, default_value = "1s")]
    pub measure_window: String,

    /// Run each probe in a freshly spawned worker process (default: true)
    /// Use --fork=false to run all probes in-process
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    pub fork: bool,

    /// Time unit for reported averages: ns, us, ms, s
    #[arg(long, default_value = "ns")]
    pub unit: String,

    /// Worker timeout in seconds
    #[arg(long, default_value = "60")]
    pub worker_timeout: u64,

    /// List probes without executing
    #[arg(long)]
    pub list: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Run as worker process (used by supervisor)
    #[arg(long, hide = true)]
    pub floor_worker: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// Run the FloorBench CLI with arguments from the environment.
/// This is the main entry point for the floorbench binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the FloorBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Handle worker mode first (before any other initialization)
    if cli.floor_worker {
        return run_worker_mode();
    }

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("floorbench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("floorbench=info")
            .init();
    }

    // Discover floorbench.toml configuration (CLI flags override)
    let config = FloorConfig::discover().unwrap_or_default();

    if cli.list {
        list_probes(&cli)?;
        return Ok(());
    }

    run_suite(&cli, &config)
}

/// Run as a worker process (IPC mode)
fn run_worker_mode() -> anyhow::Result<()> {
    let mut worker = WorkerMain::new();
    worker
        .run()
        .map_err(|e| anyhow::anyhow!("Worker error: {}", e))
}

/// Filter probe names by the CLI regex, preserving registration order.
fn filter_probes(cli: &Cli) -> anyhow::Result<Vec<&'static str>> {
    let filter_re = Regex::new(&cli.filter)
        .map_err(|e| anyhow::anyhow!("Invalid filter pattern '{}': {}", cli.filter, e))?;

    Ok(PROBE_NAMES
        .iter()
        .copied()
        .filter(|name| filter_re.is_match(name))
        .collect())
}

fn list_probes(cli: &Cli) -> anyhow::Result<()> {
    let probes = filter_probes(cli)?;

    println!("FloorBench Probes:");
    for name in &probes {
        println!("  {}", name);
    }
    println!("{} probes found.", probes.len());

    Ok(())
}

/// Build a SuiteConfig by layering: defaults → floorbench.toml → CLI flags.
///
/// clap defaults match the suite defaults, so a CLI value that differs from
/// the clap default was explicitly set by the user and wins over the file.
fn build_suite_config(cli: &Cli, config: &FloorConfig) -> anyhow::Result<SuiteConfig> {
    let warmup_batches = if cli.warmup != 3 {
        cli.warmup
    } else {
        config.runner.warmup_batches
    };
    let measure_batches = if cli.measure != 5 {
        cli.measure
    } else {
        config.runner.measure_batches
    };

    let warmup_window_str = if cli.warmup_window != "1s" {
        &cli.warmup_window
    } else {
        &config.runner.warmup_window
    };
    let measure_window_str = if cli.measure_window != "1s" {
        &cli.measure_window
    } else {
        &config.runner.measure_window
    };

    let fork = if !cli.fork { false } else { config.runner.fork };

    let unit_str = if cli.unit != "ns" {
        &cli.unit
    } else {
        &config.runner.time_unit
    };
    let time_unit = TimeUnit::from_str(unit_str)
        .map_err(|e| anyhow::anyhow!("Invalid time unit: {}", e))?;

    let suite = SuiteConfig {
        warmup_batches,
        warmup_window: Duration::from_nanos(FloorConfig::parse_duration(warmup_window_str)?),
        measure_batches,
        measure_window: Duration::from_nanos(FloorConfig::parse_duration(measure_window_str)?),
        fork_per_probe: fork,
        time_unit,
    };
    suite.validate()?;

    Ok(suite)
}

/// Resolve the worker timeout: CLI flag wins over floorbench.toml. An
/// unparsable timeout string is a configuration error, not a silent default.
fn resolve_timeout(cli: &Cli, config: &FloorConfig) -> anyhow::Result<Duration> {
    if cli.worker_timeout != 60 {
        return Ok(Duration::from_secs(cli.worker_timeout));
    }
    let nanos = FloorConfig::parse_duration(&config.runner.timeout)?;
    Ok(Duration::from_nanos(nanos))
}

fn run_suite(cli: &Cli, config: &FloorConfig) -> anyhow::Result<()> {
    let probes = filter_probes(cli)?;
    if probes.is_empty() {
        println!("No probes found.");
        return Ok(());
    }

    let suite = build_suite_config(cli, config)?;
    let plan = suite.plan();

    let mode_str = if suite.fork_per_probe {
        " (forked)"
    } else {
        " (in-process)"
    };
    println!("Running {} probes{}...\n", probes.len(), mode_str);

    let start_time = Instant::now();

    let outcomes = if suite.fork_per_probe {
        let timeout = resolve_timeout(cli, config)?;
        IsolatedExecutor::new(plan, timeout).execute(&probes)
    } else {
        let selected = floorbench_probes::registry()
            .into_iter()
            .filter(|p| probes.contains(&p.name()))
            .collect();
        Executor::new(plan).execute(selected)
    };

    // Build report
    let total_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    let rows = outcomes.into_iter().map(ProbeOutcome::into_row).collect();
    let report = Report::new(build_report_meta(&suite), rows, total_duration_ms);

    // Generate output
    let format_str = if cli.format != "human" {
        cli.format.as_str()
    } else {
        config.output.format.as_str()
    };
    let format: OutputFormat = format_str.parse().unwrap_or(OutputFormat::Human);

    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Human => generate_human_report(&report),
    };

    // Write output
    let output_path = cli
        .output
        .clone()
        .or_else(|| config.output.file.as_ref().map(PathBuf::from));
    if let Some(ref path) = output_path {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    // Any FAILED row fails the run
    if report.has_failures() {
        eprintln!("\n{} probe(s) failed", report.summary.failed);
        std::process::exit(1);
    }

    Ok(())
}
