//! rowpipe worker daemon
//!
//! Speaks the binary value protocol on stdin/stdout and serves
//! database commands against the in-memory reference backend. All
//! diagnostics go to stderr; the protocol owns stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rp_worker::config::{self, WorkerConfig};
use rp_worker::dispatch::{self, DispatchPolicy};
use rp_worker::memdb::MemDb;

#[derive(Parser)]
#[command(name = "rp-worker")]
#[command(about = "rowpipe database worker - serves commands over a stdio pipe")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dispatch policy for malformed requests (overrides config)
    #[arg(long, value_enum)]
    policy: Option<DispatchPolicy>,

    /// Maximum value nesting depth (overrides config)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum byte payload length (overrides config)
    #[arg(long)]
    max_bytes: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics must never land on the protocol stream
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("fatal: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("cannot load config from {:?}", path))?,
        None => WorkerConfig::default(),
    };

    // Command-line overrides
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(max_bytes) = args.max_bytes {
        config.max_bytes = max_bytes;
    }

    let (mut decoder, mut encoder) =
        rp_protocol::stdio_pipe(config.limits()).context("cannot bind stdio pipe")?;

    tracing::info!(policy = ?config.policy, "worker ready");

    let table = MemDb::command_table();
    let mut backend = MemDb::new();
    dispatch::serve(
        &mut decoder,
        &mut encoder,
        &table,
        &mut backend,
        config.policy,
    )?;

    tracing::info!("worker finished");
    Ok(())
}
