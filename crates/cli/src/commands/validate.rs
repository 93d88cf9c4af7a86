//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{InferenceMode, SessionConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    endpoint: String,
    mode: InferenceMode,
    target_fps: f64,
    capture: String,
    benchmark_seconds: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    endpoint: config.server.endpoint(),
                    mode: config.inference.mode,
                    target_fps: config.capture.target_fps,
                    capture: format!("{}x{}", config.capture.width, config.capture.height),
                    benchmark_seconds: config.metrics.benchmark_seconds,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SessionConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(ref path) = config.inference.model.tensor_path {
        if !path.exists() {
            warnings.push(format!(
                "inference.model.tensor_path '{}' does not exist - the mock detector will be used",
                path.display()
            ));
        }
    }

    if config.metrics.store_capacity < config.metrics.latency_window {
        warnings.push(format!(
            "metrics.store_capacity ({}) is smaller than the latency window ({}) - slow results will miss their frame",
            config.metrics.store_capacity, config.metrics.latency_window
        ));
    }

    let pixels = config.capture.width as u64 * config.capture.height as u64;
    if config.inference.mode == InferenceMode::Remote && pixels > 640 * 480 {
        warnings.push(format!(
            "capture {}x{} is large for remote upload",
            config.capture.width, config.capture.height
        ));
    }

    if config.capture.target_fps > 30.0 {
        warnings.push(format!(
            "capture.target_fps {} exceeds typical camera rates",
            config.capture.target_fps
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Relay: {}", summary.endpoint);
            println!("  Mode: {}", summary.mode);
            println!("  Capture: {} at {} fps", summary.capture, summary.target_fps);
            println!("  Benchmark: {} s", summary.benchmark_seconds);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings() {
        let mut config = SessionConfig::default();
        assert!(collect_warnings(&config).is_empty());

        config.metrics.store_capacity = 10;
        config.inference.model.tensor_path = Some("/nonexistent/out.bin".into());
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("mock detector"));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "/nonexistent/visionlink.toml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.summary.is_none());
    }
}
