//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{InferenceMode, SessionConfig};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    relay: RelayInfo,
    capture: CaptureInfo,
    mode: InferenceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ModelInfo>,
    metrics: MetricsInfo,
}

#[derive(Serialize)]
struct RelayInfo {
    endpoint: String,
    reconnect_interval_ms: u64,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct CaptureInfo {
    width: u32,
    height: u32,
    target_fps: f64,
    jpeg_quality: u8,
}

#[derive(Serialize)]
struct ModelInfo {
    input_size: u32,
    rows: usize,
    num_classes: usize,
    /// Values per candidate row
    stride: usize,
    objectness_threshold: f32,
    score_threshold: f32,
    backend: String,
}

#[derive(Serialize)]
struct MetricsInfo {
    latency_window: usize,
    store_capacity: usize,
    benchmark_seconds: u64,
    export_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prometheus_port: Option<u16>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!("Loading configuration info");

    let config = load_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    if args.toml {
        print!("{}", ConfigLoader::to_toml(&config)?);
    } else if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn backend_name(config: &SessionConfig) -> String {
    match config.inference.model.tensor_path {
        Some(ref path) => format!("tensor replay ({})", path.display()),
        None => "mock".to_string(),
    }
}

fn build_config_info(config: &SessionConfig, args: &InfoArgs) -> ConfigInfo {
    let model = &config.inference.model;
    ConfigInfo {
        version: format!("{:?}", config.version),
        relay: RelayInfo {
            endpoint: config.server.endpoint(),
            reconnect_interval_ms: config.server.reconnect_interval_ms,
            queue_capacity: config.server.queue_capacity,
        },
        capture: CaptureInfo {
            width: config.capture.width,
            height: config.capture.height,
            target_fps: config.capture.target_fps,
            jpeg_quality: config.capture.jpeg_quality,
        },
        mode: config.inference.mode,
        model: args.model.then(|| ModelInfo {
            input_size: model.input_size,
            rows: model.rows,
            num_classes: model.num_classes,
            stride: 5 + model.num_classes,
            objectness_threshold: model.objectness_threshold,
            score_threshold: model.score_threshold,
            backend: backend_name(config),
        }),
        metrics: MetricsInfo {
            latency_window: config.metrics.latency_window,
            store_capacity: config.metrics.store_capacity,
            benchmark_seconds: config.metrics.benchmark_seconds,
            export_path: config.metrics.export_path.display().to_string(),
            prometheus_port: config.metrics.prometheus_port,
        },
    }
}

fn print_config_info(config: &SessionConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               VisionLink Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Relay");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Endpoint: {}", config.server.endpoint());
    println!(
        "   ├─ Reconnect: every {} ms",
        config.server.reconnect_interval_ms
    );
    println!("   └─ Outbound queue: {}", config.server.queue_capacity);

    println!("\n📷 Capture");
    println!(
        "   ├─ Resolution: {}x{}",
        config.capture.width, config.capture.height
    );
    println!("   ├─ Rate cap: {} fps", config.capture.target_fps);
    println!("   └─ JPEG quality: {}", config.capture.jpeg_quality);

    println!("\n🧠 Inference");
    if args.model {
        let model = &config.inference.model;
        println!("   ├─ Mode: {}", config.inference.mode);
        println!("   ├─ Backend: {}", backend_name(config));
        println!("   ├─ Input: {0}x{0}", model.input_size);
        println!(
            "   ├─ Output: {} rows x {} values",
            model.rows,
            5 + model.num_classes
        );
        println!(
            "   └─ Thresholds: objectness {}, score {}",
            model.objectness_threshold, model.score_threshold
        );
    } else {
        println!("   ├─ Mode: {}", config.inference.mode);
        println!("   └─ Backend: {}", backend_name(config));
    }

    println!("\n📈 Metrics");
    println!(
        "   ├─ Window: {} samples, store {} frames",
        config.metrics.latency_window, config.metrics.store_capacity
    );
    println!(
        "   ├─ Benchmark: {} s -> {}",
        config.metrics.benchmark_seconds,
        config.metrics.export_path.display()
    );
    match config.metrics.prometheus_port {
        Some(port) => println!("   └─ Prometheus: port {}", port),
        None => println!("   └─ Prometheus: disabled"),
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_section_is_optional() {
        let config = SessionConfig::default();
        let mut args = InfoArgs {
            config: None,
            json: true,
            toml: false,
            model: false,
        };
        let value = serde_json::to_value(build_config_info(&config, &args)).unwrap();
        assert!(value.get("model").is_none());
        assert_eq!(value["relay"]["endpoint"], "127.0.0.1:8765");
        assert_eq!(value["mode"], "local");

        args.model = true;
        let value = serde_json::to_value(build_config_info(&config, &args)).unwrap();
        assert_eq!(value["model"]["stride"], 85);
        assert_eq!(value["model"]["backend"], "mock");
    }
}
