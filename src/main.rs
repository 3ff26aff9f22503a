//! Runs the queue benchmark matrix and prints one line per cell.
//!
//! Usage: `queuebench [CONFIG.json]`. Without a configuration file the
//! canonical matrix runs (1M items, 1/2/4 producers and consumers). Logs go
//! to stderr and honour `RUST_LOG`; report lines go to stdout.

use anyhow::Context;
use queuebench::bench::{write_report, BenchConfig, Harness};
use std::io::{self, Write};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => BenchConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path.to_string_lossy()))?,
        None => BenchConfig::default(),
    };
    info!(
        total_items = config.total_items,
        producers = ?config.producer_counts,
        consumers = ?config.consumer_counts,
        verify = config.verify,
        "starting benchmark"
    );

    let harness = Harness::new(config).context("invalid benchmark configuration")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let reports = harness.run_matrix_with(|report| {
        write_report(&mut out, report)?;
        out.flush()
    })?;

    let unbalanced = reports.iter().filter(|r| !r.is_balanced()).count();
    if unbalanced > 0 {
        warn!(unbalanced, "some runs finished with pushed != popped");
    }
    info!(runs = reports.len(), "benchmark finished");
    Ok(())
}
