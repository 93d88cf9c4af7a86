//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::SessionConfig;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use super::{finish, init_metrics, launch, session_config, shutdown_signal};
use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let config = session_config(&args.session)?;

    info!(
        endpoint = %config.server.endpoint(),
        mode = %config.inference.mode,
        fps = config.capture.target_fps,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    init_metrics(&config)?;
    let handle = launch(&config, &args.session)?;

    let deadline = async {
        match args.duration {
            0 => std::future::pending::<()>().await,
            secs => tokio::time::sleep(Duration::from_secs(secs)).await,
        }
    };
    tokio::pin!(deadline);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // first request one period in, not at startup
    let period = Duration::from_secs(args.server_metrics_every.max(1));
    let mut server_metrics = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping session...");
                break;
            }
            _ = &mut deadline => {
                info!(duration_secs = args.duration, "Run duration reached");
                break;
            }
            _ = server_metrics.tick(), if args.server_metrics_every > 0 => {
                if let Err(e) = handle.request_server_metrics().await {
                    debug!(error = %e, "Server metrics not requested");
                }
            }
        }
    }

    let stopped = handle.stop().await.context("Session did not stop cleanly")?;
    finish(stopped, &args.session)?;

    info!("VisionLink finished");
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &SessionConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Relay: {}", config.server.endpoint());
    println!(
        "  Reconnect every {} ms, queue {} messages",
        config.server.reconnect_interval_ms, config.server.queue_capacity
    );
    println!("\nCapture:");
    println!(
        "  {}x{} at {} fps, JPEG quality {}",
        config.capture.width,
        config.capture.height,
        config.capture.target_fps,
        config.capture.jpeg_quality
    );
    println!("\nInference: {}", config.inference.mode);
    match config.inference.model.tensor_path {
        Some(ref path) => println!("  Tensor replay: {}", path.display()),
        None => println!("  Model: mock detector"),
    }
    println!("\nMetrics:");
    println!(
        "  Window {} samples, store {} frames",
        config.metrics.latency_window, config.metrics.store_capacity
    );
    if let Some(port) = config.metrics.prometheus_port {
        println!("  Prometheus on port {port}");
    }
    println!();
}
