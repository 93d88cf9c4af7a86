//! `bench` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use std::time::Duration;
use tracing::{info, warn};

use super::{finish, init_metrics, launch, session_config, shutdown_signal};
use crate::cli::BenchArgs;
use crate::report::print_benchmark;

/// Execute the `bench` command
pub async fn run_bench(args: &BenchArgs) -> Result<()> {
    let mut config = session_config(&args.session)?;
    if let Some(secs) = args.duration {
        config.metrics.benchmark_seconds = secs;
    }
    if let Some(ref output) = args.output {
        config.metrics.export_path = output.clone();
    }
    ConfigLoader::validate(&config)?;

    init_metrics(&config)?;
    let duration = Duration::from_secs(config.metrics.benchmark_seconds);
    let handle = launch(&config, &args.session)?;

    info!(
        duration_secs = duration.as_secs(),
        mode = %config.inference.mode,
        export = %config.metrics.export_path.display(),
        "Benchmark running"
    );

    let summary = tokio::select! {
        summary = handle.run_benchmark(duration) => Some(summary.context("Benchmark failed")?),
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, benchmark abandoned");
            None
        }
    };

    let stopped = handle.stop().await.context("Session did not stop cleanly")?;
    if let Some(ref summary) = summary {
        print_benchmark(summary, &config.metrics.export_path);
    }
    finish(stopped, &args.session)
}
