//! Telemetry types - metrics snapshot, benchmark artifact, display sink

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::InferenceMode;

/// Derived statistics of the current measurement window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Frames for which a result was displayed
    pub frames: u64,
    /// Cumulative detection count
    pub detections: u64,
    pub fps: f64,
    pub avg_detections_per_frame: f64,
    pub latency_median: f64,
    pub latency_p95: f64,
    pub latency_mean: f64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} fps={:.1} detections/frame={:.2} latency median={:.0}ms p95={:.0}ms mean={:.1}ms",
            self.frames,
            self.fps,
            self.avg_detections_per_frame,
            self.latency_median,
            self.latency_p95,
            self.latency_mean
        )
    }
}

/// Benchmark export artifact.
///
/// Field names and units are consumed by external tooling and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub duration_seconds: u64,
    pub frames_processed: u64,
    pub processed_fps: f64,
    pub total_detections: u64,
    pub median_e2e_latency_ms: f64,
    pub p95_e2e_latency_ms: f64,
    pub mean_e2e_latency_ms: f64,
    pub mode: InferenceMode,
    /// ISO-8601 generation time
    pub timestamp: String,
}

/// Display sink for periodic local metrics and server-reported telemetry
pub trait TelemetrySink: Send {
    fn local_metrics(&mut self, snapshot: &MetricsSnapshot, mode: InferenceMode);

    fn server_metrics(&mut self, data: &serde_json::Value);
}
