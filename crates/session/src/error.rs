//! Session controller errors

use contracts::ContractError;
use signaling::SignalingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The media source could not be acquired. Not retried.
    #[error("media acquisition failed: {0}")]
    Acquisition(#[source] ContractError),

    /// The controller task is gone
    #[error("session has stopped")]
    Stopped,

    #[error("a benchmark is already running")]
    BenchmarkRunning,

    /// No relay channel is open
    #[error("not connected to the relay")]
    NotConnected,

    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error("failed to export benchmark summary: {0}")]
    Export(#[source] ContractError),

    /// The controller task panicked or was cancelled
    #[error("session task failed: {message}")]
    Task { message: String },
}

impl SessionError {
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}
