//! # VisionLink CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Live sessions and fixed-duration benchmarks
//! - Graceful shutdown handling

mod cli;
mod commands;
mod error;
mod report;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_bench, run_info, run_session, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "VisionLink CLI starting");

    let result = match &cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Bench(args) => run_bench(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging only; the metrics exporter is installed per command from config
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(logging_config(cli))
}

fn logging_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        ignore_env: cli.quiet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_levels() {
        let cli = Cli::try_parse_from(["visionlink", "-vv", "info"]).unwrap();
        let config = logging_config(&cli);
        assert_eq!(config.default_log_level, "trace");
        assert!(!config.ignore_env);

        let cli = Cli::try_parse_from(["visionlink", "-q", "info"]).unwrap();
        let config = logging_config(&cli);
        assert_eq!(config.default_log_level, "warn");
        assert!(config.ignore_env);
    }
}
