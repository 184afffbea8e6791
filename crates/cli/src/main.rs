//! Command-line driver for the multicore scheduling simulator.
//!
//! Builds a [`Config`] from built-in defaults, an optional `--config` JSON
//! file, and individual CLI flags (in that precedence order), loads a
//! process batch, then drives [`SchedulerCore::tick`] to completion or until
//! an advisory `--cycle-budget` is exhausted.

mod loader;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use msim_core::config::{Config, PolicyKind};
use msim_core::{SchedulerCore, SimError};
use msim_isa::ReferenceEngine;

use report::PolicyRun;

/// Output format for `--report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum ReportFormat {
    /// Human-readable text (the default).
    Text,
    /// Machine-readable CSV.
    Csv,
}

/// Multicore CPU/OS scheduling and memory-hierarchy simulator.
#[derive(Debug, Parser)]
#[command(name = "msim", author, version, about)]
struct Cli {
    /// Number of virtual cores.
    #[arg(long)]
    cores: Option<usize>,

    /// Instructions per dispatch for preemptible policies.
    #[arg(long)]
    quantum: Option<u32>,

    /// Scheduling policy.
    #[arg(long, value_parser = ["fcfs", "sjn", "rr", "prio", "prio_preempt"])]
    policy: Option<String>,

    /// Equivalent to an unbounded quantum for `rr`.
    #[arg(long)]
    non_preemptive: bool,

    /// Optional JSON file overriding defaults before flags are applied.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON batch of process descriptors.
    #[arg(long)]
    programs: PathBuf,

    /// Report output path. Prints to stdout as text if omitted.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Report output format.
    #[arg(long, value_enum, default_value = "text")]
    report_format: ReportFormat,

    /// Advisory host-loop stop condition; unlimited if omitted.
    #[arg(long)]
    cycle_budget: Option<u64>,
}

fn main() -> ExitCode {
    let filter = std::env::var("SIM_LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .map_or("info".to_string(), |level| {
            match level {
                0 => "error",
                1 => "warn",
                2 => "info",
                3 => "debug",
                _ => "trace",
            }
            .to_string()
        });
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Config(err)) => {
            eprintln!("configuration error: {err}");
            ExitCode::from(1)
        }
        Err(CliError::Loader(err)) => {
            eprintln!("loader error: {err}");
            ExitCode::from(1)
        }
        Err(CliError::Runtime(err)) => {
            eprintln!("runtime fault: {err}");
            ExitCode::from(2)
        }
        Err(CliError::Report(err)) => {
            eprintln!("report error: {err}");
            ExitCode::from(1)
        }
    }
}

#[derive(Debug)]
enum CliError {
    Config(SimError),
    Loader(loader::LoaderError),
    Runtime(SimError),
    Report(report::ReportError),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };

    if let Some(cores) = cli.cores {
        config.cores = cores;
    }
    if let Some(quantum) = cli.quantum {
        config.quantum = Some(quantum);
    }
    if let Some(policy) = &cli.policy {
        config.policy = PolicyKind::parse_cli(policy).map_err(CliError::Config)?;
    }
    if cli.non_preemptive {
        config.quantum = None;
    }
    if let Some(budget) = cli.cycle_budget {
        config.cycle_budget = Some(budget);
    }

    config.validate().map_err(CliError::Config)?;

    let engine: Arc<dyn msim_core::engine::InstructionEngine> = Arc::new(ReferenceEngine::new());
    let mut sched = SchedulerCore::new(&config, engine);

    let processes = loader::load_processes(&cli.programs, 0, sched.memory(), config.weights)
        .map_err(CliError::Loader)?;
    info!(count = processes.len(), "loaded process batch");

    for pcb in processes {
        sched.admit(pcb).map_err(CliError::Runtime)?;
    }

    let mut ticks: u64 = 0;
    while !sched.all_finished() {
        sched.tick().map_err(CliError::Runtime)?;
        ticks += 1;
        if let Some(budget) = config.cycle_budget {
            if ticks >= budget {
                warn!(ticks, "cycle budget exhausted with work still pending");
                break;
            }
        }
    }
    sched.shutdown().map_err(CliError::Runtime)?;

    let stats = sched.statistics();
    let counters = sched.memory().counters();
    let policy_name = cli.policy.as_deref().unwrap_or("rr");
    let run = PolicyRun {
        policy: policy_name,
        cores: config.cores,
        stats,
        cache_hits: counters.cache_hits,
        cache_misses: counters.cache_misses,
    };

    match &cli.report {
        Some(path) => match cli.report_format {
            ReportFormat::Csv => report::write_csv(&[run], path).map_err(CliError::Report)?,
            ReportFormat::Text => report::write_text(&[run], path).map_err(CliError::Report)?,
        },
        None => print!("{}", report::render_text(&[run])),
    }

    Ok(())
}

fn load_config_file(path: &PathBuf) -> Result<Config, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(SimError::ConfigError(format!("reading {}: {e}", path.display()))))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Config(SimError::ConfigError(format!("parsing {}: {e}", path.display()))))
}
