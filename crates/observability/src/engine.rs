//! Metrics Engine
//!
//! Bounded per-run counters plus a latency window of the most recent
//! samples. Statistics are derived on demand from a sorted copy of the
//! window, so ingestion stays O(1).

use std::collections::VecDeque;
use std::path::Path;

use contracts::{
    iso_timestamp, BenchmarkSummary, ContractError, FrameRecord, InferenceMode, MetricsSnapshot,
    SharedClock,
};
use tracing::{debug, info};

pub const DEFAULT_LATENCY_WINDOW: usize = 100;

#[derive(Debug)]
pub struct MetricsEngine {
    clock: SharedClock,
    capacity: usize,
    frames: u64,
    detections: u64,
    latencies: VecDeque<u64>,
    start_time: u64,
}

impl MetricsEngine {
    pub fn new(clock: SharedClock, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let start_time = clock.now_ms();
        Self {
            clock,
            capacity,
            frames: 0,
            detections: 0,
            latencies: VecDeque::with_capacity(capacity),
            start_time,
        }
    }

    /// Ingest a displayed frame. Records without a display time still count
    /// toward `frames` and `detections` but add no latency sample.
    pub fn record(&mut self, record: &FrameRecord) {
        self.frames += 1;
        self.detections += record.detections.len() as u64;
        if let Some(latency) = record.e2e_latency_ms() {
            self.push_latency(latency);
        }
    }

    /// Ingest raw values, for callers that don't hold a [`FrameRecord`]
    pub fn record_sample(&mut self, detections: usize, latency_ms: u64) {
        self.frames += 1;
        self.detections += detections as u64;
        self.push_latency(latency_ms);
    }

    fn push_latency(&mut self, latency_ms: u64) {
        if self.latencies.len() == self.capacity {
            self.latencies.pop_front();
        }
        self.latencies.push_back(latency_ms);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn detections(&self) -> u64 {
        self.detections
    }

    /// Window contents, oldest first
    pub fn latencies(&self) -> impl ExactSizeIterator<Item = u64> + '_ {
        self.latencies.iter().copied()
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.start_time)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let elapsed_s = self.elapsed_ms() as f64 / 1000.0;
        let fps = if elapsed_s > 0.0 {
            self.frames as f64 / elapsed_s
        } else {
            0.0
        };
        let avg_detections_per_frame = if self.frames > 0 {
            self.detections as f64 / self.frames as f64
        } else {
            0.0
        };

        let stats = LatencyStats::compute(self.latencies.iter().copied());

        MetricsSnapshot {
            frames: self.frames,
            detections: self.detections,
            fps,
            avg_detections_per_frame,
            latency_median: stats.median,
            latency_p95: stats.p95,
            latency_mean: stats.mean,
        }
    }

    /// Clear counters and window; the measurement window restarts now.
    pub fn reset(&mut self) {
        self.frames = 0;
        self.detections = 0;
        self.latencies.clear();
        self.start_time = self.clock.now_ms();
        debug!(start_time = self.start_time, "Metrics reset");
    }

    pub fn benchmark_summary(&self, duration_seconds: u64, mode: InferenceMode) -> BenchmarkSummary {
        let snapshot = self.snapshot();
        BenchmarkSummary {
            duration_seconds,
            frames_processed: snapshot.frames,
            processed_fps: snapshot.fps,
            total_detections: snapshot.detections,
            median_e2e_latency_ms: snapshot.latency_median,
            p95_e2e_latency_ms: snapshot.latency_p95,
            mean_e2e_latency_ms: snapshot.latency_mean,
            mode,
            timestamp: iso_timestamp(self.clock.now_ms()),
        }
    }
}

/// Median / P95 / mean over a latency window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyStats {
    pub median: f64,
    pub p95: f64,
    pub mean: f64,
}

impl LatencyStats {
    pub fn compute(samples: impl Iterator<Item = u64>) -> Self {
        let mut sorted: Vec<u64> = samples.collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_unstable();
        let sum: u64 = sorted.iter().sum();
        Self {
            median: percentile(&sorted, 0.5),
            p95: percentile(&sorted, 0.95),
            mean: sum as f64 / sorted.len() as f64,
        }
    }
}

/// `sorted[floor(n * p)]`, clamped to the last element
fn percentile(sorted: &[u64], p: f64) -> f64 {
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx] as f64
}

/// Write a benchmark summary as pretty JSON
pub fn write_summary(summary: &BenchmarkSummary, path: &Path) -> Result<(), ContractError> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| ContractError::Other(format!("serialize benchmark summary: {e}")))?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), frames = summary.frames_processed, "Benchmark summary exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FrameId, ManualClock};
    use rand::Rng;
    use std::sync::Arc;

    fn engine(start: u64) -> (Arc<ManualClock>, MetricsEngine) {
        let clock = Arc::new(ManualClock::new(start));
        let engine = MetricsEngine::new(clock.clone(), DEFAULT_LATENCY_WINDOW);
        (clock, engine)
    }

    #[test]
    fn test_empty_snapshot_is_zeroed() {
        let (_clock, engine) = engine(0);
        assert_eq!(engine.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counts_match_calls() {
        let (_clock, mut engine) = engine(0);
        let mut rng = rand::rng();
        let mut expected = 0u64;
        let calls = rng.random_range(1..300);
        for _ in 0..calls {
            let n = rng.random_range(0..6);
            expected += n as u64;
            engine.record_sample(n, rng.random_range(0..500));
        }
        assert_eq!(engine.frames(), calls as u64);
        assert_eq!(engine.detections(), expected);
        assert!(engine.latencies().len() <= DEFAULT_LATENCY_WINDOW);
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let (_clock, mut engine) = engine(0);
        for i in 0..101u64 {
            engine.record_sample(0, i);
        }
        let window: Vec<u64> = engine.latencies().collect();
        assert_eq!(window.len(), 100);
        assert_eq!(window, (1..101).collect::<Vec<_>>());
    }

    #[test]
    fn test_p95_not_below_median() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let n = rng.random_range(1..150);
            let samples: Vec<u64> = (0..n).map(|_| rng.random_range(0..1000)).collect();
            let stats = LatencyStats::compute(samples.into_iter());
            assert!(stats.p95 >= stats.median);
        }
    }

    #[test]
    fn test_percentile_indexing() {
        let stats = LatencyStats::compute([40, 10, 30, 20].into_iter());
        // floor(4 * 0.5) = 2, floor(4 * 0.95) = 3
        assert_eq!(stats.median, 30.0);
        assert_eq!(stats.p95, 40.0);
        assert_eq!(stats.mean, 25.0);

        let single = LatencyStats::compute([7].into_iter());
        assert_eq!((single.median, single.p95, single.mean), (7.0, 7.0, 7.0));
    }

    #[test]
    fn test_fps_and_record() {
        let (clock, mut engine) = engine(10_000);
        for seq in 0..4 {
            let mut record = FrameRecord::captured(FrameId::from_sequence(seq), seq, 10_000);
            record.display_ts = Some(10_040);
            engine.record(&record);
        }
        clock.advance(2_000);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.frames, 4);
        assert!((snapshot.fps - 2.0).abs() < 1e-9);
        assert_eq!(snapshot.latency_median, 40.0);
    }

    #[test]
    fn test_undisplayed_record_adds_no_latency() {
        let (_clock, mut engine) = engine(0);
        engine.record(&FrameRecord::captured(FrameId::from_sequence(1), 1, 0));
        assert_eq!(engine.frames(), 1);
        assert_eq!(engine.latencies().len(), 0);
    }

    #[test]
    fn test_reset_restarts_window() {
        let (clock, mut engine) = engine(0);
        engine.record_sample(2, 10);
        clock.advance(5_000);
        engine.reset();
        assert_eq!(engine.start_time(), 5_000);
        assert_eq!(engine.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_benchmark_summary_and_export() {
        let (clock, mut engine) = engine(1_700_000_000_000);
        for latency in [40, 50, 60] {
            engine.record_sample(1, latency);
        }
        clock.advance(3_000);

        let summary = engine.benchmark_summary(3, InferenceMode::Local);
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.total_detections, 3);
        assert!((summary.processed_fps - 1.0).abs() < 1e-9);
        assert_eq!(summary.median_e2e_latency_ms, 50.0);
        assert_eq!(summary.timestamp, "2023-11-14T22:13:23.000Z");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        write_summary(&summary, &path).unwrap();
        let back: BenchmarkSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, summary);
    }
}
