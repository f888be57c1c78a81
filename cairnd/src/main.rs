//! # Cairn Node Daemon
//!
//! Main entry point for the per-node scheduler host.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cairnd::{DaemonConfig, DaemonRuntime, NodeConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// cairnd - per-node service lifecycle scheduler
#[derive(Parser, Debug)]
#[command(name = "cairnd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to node configuration file
    #[arg(short, long, default_value = "cairn.toml")]
    config: PathBuf,

    /// Event script to replay against the node
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Maximum ticks to run (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_ticks: u64,

    /// Exit once the queue is empty and nothing is left to do
    #[arg(long)]
    exit_on_idle: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let node_config = NodeConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let script = args
        .script
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read script {}", path.display()))
        })
        .transpose()?;

    let runtime = DaemonRuntime::new(
        &node_config,
        DaemonConfig {
            script,
            max_ticks: args.max_ticks,
            exit_on_idle: args.exit_on_idle,
        },
    )
    .context("failed to start scheduler")?;

    let summary = runtime.run();
    info!(
        reason = ?summary.reason,
        ticks = summary.shutdown.ticks,
        abandoned_sequences = summary.shutdown.leftovers.abandoned_sequences,
        "cairnd exiting"
    );
    Ok(())
}
