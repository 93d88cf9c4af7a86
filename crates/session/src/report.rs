//! Status and end-of-run report

use std::time::Duration;

use contracts::{InferenceMode, MetricsSnapshot};
use signaling::SignalingState;

/// Point-in-time view of a running session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub mode: InferenceMode,
    /// `None` while no relay channel is open
    pub signaling: Option<SignalingState>,
    pub detector_ready: bool,
    pub frames_captured: u64,
    pub frames_dropped: u64,
    pub results_applied: u64,
    pub reconnects: u64,
}

impl SessionStatus {
    pub fn is_connected(&self) -> bool {
        self.signaling == Some(SignalingState::Connected)
    }
}

/// Returned by `SessionHandle::stop`
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub mode: InferenceMode,
    pub runtime: Duration,
    pub frames_captured: u64,
    pub frames_dropped: u64,
    pub results_applied: u64,
    pub correlation_misses: u64,
    pub duplicates: u64,
    /// Reconnect attempts after a failed or lost channel
    pub reconnects: u64,
    /// Channels successfully opened
    pub connections: u64,
    pub server_reports: u64,
    /// Metrics of the last measurement window
    pub snapshot: MetricsSnapshot,
}

impl SessionReport {
    /// Captured frames per second over the whole run
    pub fn capture_fps(&self) -> f64 {
        let secs = self.runtime.as_secs_f64();
        if secs > 0.0 {
            self.frames_captured as f64 / secs
        } else {
            0.0
        }
    }

    /// Dropped ticks as a percentage of all capture ticks
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_captured + self.frames_dropped;
        if total > 0 {
            self.frames_dropped as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}
