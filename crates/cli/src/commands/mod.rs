//! Command implementations.

mod bench;
mod info;
mod run;
mod validate;

pub use bench::run_bench;
pub use info::run_info;
pub use run::run_session;
pub use validate::run_validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use config_loader::ConfigLoader;
use contracts::SessionConfig;
use media::SyntheticCamera;
use overlay::ImageSurface;
use session::{SessionBuilder, SessionHandle, StoppedSession};
use signaling::TcpConnector;
use tracing::{info, warn};

use crate::cli::SessionArgs;
use crate::error::{CliError, Result};
use crate::report::print_report;

/// Load the config file (or defaults), then validate
fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(SessionConfig::default());
    };
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    info!(config = %path.display(), "Loading configuration");
    Ok(ConfigLoader::load_from_path(path)?)
}

/// Effective session configuration: file, then CLI overrides, then validation
fn session_config(args: &SessionArgs) -> Result<SessionConfig> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    ConfigLoader::validate(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut SessionConfig, args: &SessionArgs) {
    if let Some(mode) = args.mode {
        info!(mode = ?mode, "Overriding inference mode from CLI");
        config.inference.mode = mode.into();
    }
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding relay host from CLI");
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port, "Overriding relay port from CLI");
        config.server.port = port;
    }
    if let Some(fps) = args.fps {
        config.capture.target_fps = fps;
    }
    if let Some(ref tensor) = args.tensor {
        config.inference.model.tensor_path = Some(tensor.clone());
    }
    match args.metrics_port {
        Some(0) => config.metrics.prometheus_port = None,
        Some(port) => config.metrics.prometheus_port = Some(port),
        None => {}
    }
}

fn init_metrics(config: &SessionConfig) -> anyhow::Result<()> {
    if let Some(port) = config.metrics.prometheus_port {
        observability::init_metrics_only(port)?;
        info!("Metrics endpoint available on port {}", port);
    }
    Ok(())
}

/// Start a session on the synthetic camera, talking TCP to the relay
fn launch(config: &SessionConfig, args: &SessionArgs) -> Result<SessionHandle<ImageSurface>> {
    let (width, height) = args.source_size;
    let connector = Arc::new(TcpConnector::new(
        config.server.endpoint(),
        config.server.queue_capacity,
    ));
    let surface = ImageSurface::new(config.capture.width, config.capture.height);

    info!(
        endpoint = %config.server.endpoint(),
        mode = %config.inference.mode,
        fps = config.capture.target_fps,
        "Starting session"
    );
    Ok(SessionBuilder::new(config.clone()).start(
        SyntheticCamera::with_size(width, height),
        surface,
        connector,
    )?)
}

/// Print the report and write the overlay if asked
fn finish(stopped: StoppedSession<ImageSurface>, args: &SessionArgs) -> anyhow::Result<()> {
    print_report(&stopped.report);
    if let Some(ref path) = args.overlay_out {
        stopped
            .surface
            .save_png(path)
            .map_err(CliError::from)
            .with_context(|| format!("Failed to save overlay to {}", path.display()))?;
        info!(path = %path.display(), "Overlay saved");
    }
    Ok(())
}

/// Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
