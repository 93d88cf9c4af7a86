//! LogTelemetrySink - writes periodic metrics through tracing

use contracts::{InferenceMode, MetricsSnapshot, TelemetrySink};
use tracing::info;

pub struct LogTelemetrySink {
    name: String,
    server_reports: u64,
}

impl LogTelemetrySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_reports: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_reports(&self) -> u64 {
        self.server_reports
    }
}

impl Default for LogTelemetrySink {
    fn default() -> Self {
        Self::new("log")
    }
}

impl TelemetrySink for LogTelemetrySink {
    fn local_metrics(&mut self, snapshot: &MetricsSnapshot, mode: InferenceMode) {
        info!(
            sink = %self.name,
            mode = %mode,
            frames = snapshot.frames,
            detections = snapshot.detections,
            fps = format_args!("{:.1}", snapshot.fps),
            per_frame = format_args!("{:.2}", snapshot.avg_detections_per_frame),
            median_ms = snapshot.latency_median,
            p95_ms = snapshot.latency_p95,
            mean_ms = format_args!("{:.1}", snapshot.latency_mean),
            "Live metrics"
        );
    }

    fn server_metrics(&mut self, data: &serde_json::Value) {
        self.server_reports += 1;
        info!(sink = %self.name, data = %data, "Server metrics");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_accepts_reports() {
        let mut sink = LogTelemetrySink::new("test_log");
        sink.local_metrics(&MetricsSnapshot::default(), InferenceMode::Local);
        sink.server_metrics(&serde_json::json!({ "gpu": 0.4 }));
        assert_eq!(sink.name(), "test_log");
        assert_eq!(sink.server_reports(), 1);
    }
}
