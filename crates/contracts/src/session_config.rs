//! SessionConfig - Config Loader output
//!
//! Describes the relay endpoint, capture cadence, inference model layout and
//! metrics window. Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::InferenceMode;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Relay channel endpoint
    #[serde(default)]
    pub server: ServerConfig,

    /// Capture loop settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Inference routing and model layout
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Metrics window and benchmark export
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Relay channel endpoint and reconnect policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Fixed delay before reconnecting after channel failure
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Outbound message queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_reconnect_interval_ms() -> u64 {
    3000
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl ServerConfig {
    /// `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Capture cadence and downscale target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Dispatch rate cap, independent of display refresh
    #[serde(default = "default_target_fps")]
    pub target_fps: f64,

    #[serde(default = "default_capture_width")]
    pub width: u32,

    #[serde(default = "default_capture_height")]
    pub height: u32,

    /// JPEG quality for remote upload (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_target_fps() -> f64 {
    15.0
}

fn default_capture_width() -> u32 {
    320
}

fn default_capture_height() -> u32 {
    240
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            width: default_capture_width(),
            height: default_capture_height(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Inference routing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Initial mode; the server may switch it with a `config` message
    #[serde(default)]
    pub mode: InferenceMode,

    #[serde(default)]
    pub model: ModelConfig,
}

/// Raw output layout of the on-device detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Square model input edge in pixels
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Candidate rows in the output tensor
    #[serde(default = "default_rows")]
    pub rows: usize,

    #[serde(default = "default_num_classes")]
    pub num_classes: usize,

    /// Early reject below this objectness
    #[serde(default = "default_objectness_threshold")]
    pub objectness_threshold: f32,

    /// Reject when objectness × class score falls below this
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Raw little-endian f32 output tensor to replay instead of running a model
    #[serde(default)]
    pub tensor_path: Option<PathBuf>,
}

fn default_input_size() -> u32 {
    640
}

fn default_rows() -> usize {
    25200
}

fn default_num_classes() -> usize {
    80
}

fn default_objectness_threshold() -> f32 {
    0.5
}

fn default_score_threshold() -> f32 {
    0.3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: default_input_size(),
            rows: default_rows(),
            num_classes: default_num_classes(),
            objectness_threshold: default_objectness_threshold(),
            score_threshold: default_score_threshold(),
            tensor_path: None,
        }
    }
}

/// Metrics window and benchmark settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Latency samples kept (most recent)
    #[serde(default = "default_window")]
    pub latency_window: usize,

    /// Frame records kept in the recency store
    #[serde(default = "default_window")]
    pub store_capacity: usize,

    /// Period of the local metrics display
    #[serde(default = "default_display_interval_ms")]
    pub display_interval_ms: u64,

    #[serde(default = "default_benchmark_seconds")]
    pub benchmark_seconds: u64,

    /// Where the benchmark summary is written
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,

    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub prometheus_port: Option<u16>,
}

fn default_window() -> usize {
    100
}

fn default_display_interval_ms() -> u64 {
    1000
}

fn default_benchmark_seconds() -> u64 {
    30
}

fn default_export_path() -> PathBuf {
    PathBuf::from("metrics.json")
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            latency_window: default_window(),
            store_capacity: default_window(),
            display_interval_ms: default_display_interval_ms(),
            benchmark_seconds: default_benchmark_seconds(),
            export_path: default_export_path(),
            prometheus_port: None,
        }
    }
}
