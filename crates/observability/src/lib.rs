//! # Observability
//!
//! Tracing and Prometheus setup, plus the in-process Metrics Engine.
//!
//! - Tracing init (JSON / Pretty / Compact), filter from `RUST_LOG`
//! - Prometheus exporter on an optional port
//! - [`MetricsEngine`]: frame counters and the bounded latency window
//! - [`LogTelemetrySink`]: periodic metrics display through tracing
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: Some(9100),
//!     ..Default::default()
//! })?;
//! ```

mod engine;
pub mod metrics;
mod telemetry;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::engine::{write_summary, LatencyStats, MetricsEngine, DEFAULT_LATENCY_WINDOW};
pub use crate::metrics::DropReason;
pub use crate::telemetry::LogTelemetrySink;

/// Initialize with defaults (JSON logs, no exporter)
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// Observability settings
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Filter used when `RUST_LOG` is unset
    pub default_log_level: String,
    /// Use `default_log_level` even if `RUST_LOG` is set
    pub ignore_env: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
            ignore_env: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    /// Single-line, human readable
    Compact,
}

/// Install the tracing subscriber and, if a port is set, the Prometheus exporter.
///
/// # Errors
/// Fails if a global subscriber or recorder is already installed.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = if config.ignore_env {
        EnvFilter::new(&config.default_log_level)
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level))
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        install_exporter(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus exporter, for hosts that own tracing setup
pub fn init_metrics_only(port: u16) -> Result<()> {
    install_exporter(port)
}

fn install_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert!(matches!(config.log_format, LogFormat::Json));
        assert_eq!(config.default_log_level, "info");
    }
}
