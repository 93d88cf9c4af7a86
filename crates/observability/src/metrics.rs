//! Prometheus recorders for the frame pipeline and signaling.
//!
//! Thin wrappers over the `metrics` facade so metric names live in one
//! place. Without an installed recorder these are no-ops.

use contracts::InferenceMode;
use metrics::{counter, gauge, histogram};

/// Why a capture tick produced no dispatched frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Source had no new pixels
    NoFrame,
    /// Remote mode with no open channel
    ChannelDown,
    /// Outbound queue full
    QueueFull,
    /// Local decode still running
    DetectorBusy,
    /// Frame could not be encoded
    Encode,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoFrame => "no_frame",
            Self::ChannelDown => "channel_down",
            Self::QueueFull => "queue_full",
            Self::DetectorBusy => "detector_busy",
            Self::Encode => "encode",
        }
    }
}

pub fn record_frame_captured() {
    counter!("visionlink_frames_captured_total").increment(1);
}

pub fn record_frame_dropped(reason: DropReason) {
    counter!("visionlink_frames_dropped_total", "reason" => reason.as_str()).increment(1);
}

/// A result was applied to its frame and displayed
pub fn record_result(mode: InferenceMode, detections: usize, latency_ms: u64) {
    counter!("visionlink_results_total", "mode" => mode.as_str()).increment(1);
    counter!("visionlink_detections_total").increment(detections as u64);
    histogram!("visionlink_e2e_latency_ms").record(latency_ms as f64);
}

pub fn record_correlation_miss() {
    counter!("visionlink_correlation_miss_total").increment(1);
}

pub fn record_reconnect() {
    counter!("visionlink_channel_reconnects_total").increment(1);
}

/// Signaling state as an ordinal: idle=0 .. closed=4
pub fn record_signaling_state(ordinal: u8) {
    gauge!("visionlink_signaling_state").set(ordinal as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_without_exporter() {
        record_frame_captured();
        record_frame_dropped(DropReason::QueueFull);
        record_result(InferenceMode::Remote, 2, 48);
        record_correlation_miss();
        record_reconnect();
        record_signaling_state(3);
    }

    #[test]
    fn test_drop_reason_labels() {
        assert_eq!(DropReason::NoFrame.as_str(), "no_frame");
        assert_eq!(DropReason::ChannelDown.as_str(), "channel_down");
    }
}
