//! Trace-driven cache level simulator CLI.
//!
//! This binary drives one cache level from an access trace. It provides:
//! 1. **Run:** Validate a configuration, replay a trace through the controller backed by
//!    a fixed-latency memory, and report statistics (optionally as JSON).
//! 2. **Check:** Validate a configuration and print the derived parameters.
//!
//! Logging goes to stderr and is filtered by `RUST_LOG` or the `-v` flags.

mod fill;
mod trace;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use memhier_core::{
    CacheConfig, CacheController, CacheParams, ConfigError,
    common::{Cycle, EventId},
    link::BufferedLink,
    prefetch::{CacheListener, NextLinePrefetcher},
    protocol::{CoherenceProtocol, ProtocolParams},
    stats::CacheStats,
};

use crate::{
    fill::{FillProtocol, FixedLatencyMemory},
    trace::TraceError,
};

/// Memory latency used when the run configuration does not set one.
const DEFAULT_MEMORY_LATENCY: Cycle = 100;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Cycle-driven model of one cache level",
    long_about = "Replay an access trace through one cache level backed by a fixed-latency memory.\n\nExamples:\n  cachesim run --config l2.json --trace accesses.trace\n  cachesim run -c l2.json -t accesses.trace --json report.json -vv\n  cachesim check --config l2.json"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace through the cache.
    Run {
        /// Run configuration (JSON).
        #[arg(short, long)]
        config: PathBuf,

        /// Access trace.
        #[arg(short, long)]
        trace: PathBuf,

        /// Stop after this many cycles.
        #[arg(long)]
        max_cycles: Option<Cycle>,

        /// Write a JSON report to this file.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Do not print the statistics report.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Validate a configuration and print the derived parameters.
    Check {
        /// Run configuration (JSON).
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Prefetcher attached to the cache.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum PrefetcherKind {
    #[default]
    None,
    NextLine,
}

/// Contents of a run configuration file.
#[derive(Debug, Deserialize)]
struct RunConfig {
    /// Cache level parameters.
    cache: CacheConfig,

    /// Cycles the backing memory takes to answer a request.
    #[serde(default = "RunConfig::default_memory_latency")]
    memory_latency: Cycle,

    #[serde(default)]
    prefetcher: PrefetcherKind,
}

impl RunConfig {
    const fn default_memory_latency() -> Cycle {
        DEFAULT_MEMORY_LATENCY
    }

    fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(ConfigError::from)?;
        Ok(serde_json::from_str(&text).map_err(ConfigError::from)?)
    }
}

/// Errors that end a command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("failed to write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("simulation stopped at cycle {cycle}: {source}")]
    Sim {
        cycle: Cycle,
        source: memhier_core::SimError,
    },
}

/// Summary written by `--json`.
#[derive(Debug, Serialize)]
struct Report<'a> {
    cache: &'a str,
    cycles: Cycle,
    accesses: usize,
    completed: u64,
    mean_latency: f64,
    memory_reads: u64,
    memory_writes: u64,
    stats: &'a CacheStats,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            trace,
            max_cycles,
            json,
            quiet,
        } => cmd_run(&config, &trace, max_cycles, json.as_deref(), quiet),
        Commands::Check { config } => cmd_check(&config),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validates the configuration and prints what the controller would be built with.
fn cmd_check(path: &Path) -> Result<(), CliError> {
    let run = RunConfig::load(path)?;
    let params = run.cache.validate()?;
    print_params(&params);
    println!("  memory latency         {}", run.memory_latency);
    println!("  prefetcher             {:?}", run.prefetcher);
    Ok(())
}

fn print_params(params: &CacheParams) {
    println!("Cache: {}", params.log.component());
    println!("  protocol               {}", params.protocol_kind.name());
    println!("  size                   {} B", params.cache_size);
    println!(
        "  geometry               {} lines x {} B, {}-way",
        params.lines, params.line_size, params.associativity
    );
    println!("  replacement            {:?}", params.replacement);
    println!("  hash                   {:?}", params.hash);
    if let Some(dir) = &params.directory {
        println!(
            "  directory              {} entries, {}-way, {:?}",
            dir.entries, dir.associativity, dir.replacement
        );
    }
    println!(
        "  latency                access {} tag {} mshr {}",
        params.access_latency, params.tag_latency, params.mshr_latency
    );
    println!("  banks                  {}", params.banks);
    println!("  mshr                   {} entries", params.mshr_size);
    println!(
        "  prefetch               max {} drop at {} delay {}",
        params.prefetch.max_outstanding, params.prefetch.drop_level, params.prefetch.delay
    );
    match params.max_requests_per_cycle {
        Some(limit) => println!("  requests/cycle         {limit}"),
        None => println!("  requests/cycle         unlimited"),
    }
    if let Some(region) = &params.region {
        println!(
            "  region                 [{:#x}, {:#x}] size {} step {}",
            region.start, region.end, region.interleave_size, region.interleave_step
        );
    }
    if params.watchdog.enabled() {
        println!(
            "  watchdog               {} cycles, checked every {}",
            params.watchdog.max_wait, params.watchdog.check_interval
        );
    }
}

/// Replays a trace through the cache until every access has completed.
///
/// # Arguments
///
/// * `config_path` - Run configuration.
/// * `trace_path` - Access trace.
/// * `max_cycles` - Optional cycle bound.
/// * `json` - Optional report destination.
/// * `quiet` - Skip the printed report.
fn cmd_run(
    config_path: &Path,
    trace_path: &Path,
    max_cycles: Option<Cycle>,
    json: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    let run = RunConfig::load(config_path)?;
    let entries = trace::load(trace_path)?;
    let params = run.cache.validate()?;
    let name = params.log.component().to_string();

    let listeners: Vec<Box<dyn CacheListener>> = match run.prefetcher {
        PrefetcherKind::None => Vec::new(),
        PrefetcherKind::NextLine => vec![Box::new(NextLinePrefetcher::new(params.line_size))],
    };
    let (up, up_out) = BufferedLink::new("cpu");
    let (down, down_out) = BufferedLink::new("memory");
    let mut controller = CacheController::new(
        params,
        |p: &ProtocolParams| -> Box<dyn CoherenceProtocol> { Box::new(FillProtocol::new(p)) },
        Box::new(up),
        Box::new(down),
        listeners,
    )?;
    let mut memory = FixedLatencyMemory::new(run.memory_latency);

    tracing::info!(cache = %name, accesses = entries.len(), "starting trace replay");

    let accesses = entries.len();
    let mut issued: HashMap<EventId, Cycle> = HashMap::with_capacity(accesses);
    let mut completed = 0_u64;
    let mut total_latency = 0_u64;
    let mut trace = entries.into_iter().peekable();

    loop {
        let next = controller.cycle() + 1;
        while let Some(entry) = trace.next_if(|e| e.cycle <= next) {
            let _ = issued.insert(entry.event.id, entry.cycle);
            controller.receive(entry.event);
        }
        for response in memory.due(next) {
            controller.receive(response);
        }

        if let Err(source) = controller.tick() {
            controller.stats().print(&name);
            return Err(CliError::Sim {
                cycle: controller.cycle(),
                source,
            });
        }

        let now = controller.cycle();
        for event in down_out.drain_ready(now) {
            memory.accept(&event, now);
        }
        for event in up_out.drain_ready(now) {
            if let Some(start) = issued.remove(&event.id) {
                completed += 1;
                total_latency += now.saturating_sub(start);
            }
        }

        let drained = trace.peek().is_none()
            && memory.is_idle()
            && controller.is_idle()
            && up_out.is_empty()
            && down_out.is_empty();
        if drained {
            break;
        }
        if max_cycles.is_some_and(|max| now >= max) {
            tracing::warn!(cycle = now, "cycle limit reached before the trace drained");
            break;
        }
    }

    let mean_latency = if completed == 0 {
        0.0
    } else {
        total_latency as f64 / completed as f64
    };
    if !quiet {
        controller.stats().print(&name);
        println!("TRACE");
        println!("  accesses               {accesses}");
        println!("  completed              {completed}");
        println!("  mean_latency           {mean_latency:.2}");
        println!("  memory.reads           {}", memory.reads());
        println!("  memory.writes          {}", memory.writes());
    }

    if let Some(path) = json {
        let report = Report {
            cache: &name,
            cycles: controller.cycle(),
            accesses,
            completed,
            mean_latency,
            memory_reads: memory.reads(),
            memory_writes: memory.writes(),
            stats: controller.stats(),
        };
        let text = serde_json::to_string_pretty(&report).map_err(ConfigError::from)?;
        fs::write(path, text).map_err(|source| CliError::Report {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
