//! Detector error types

use contracts::ContractError;
use thiserror::Error;

/// Failure turning a model output into detections
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Output buffer shorter than `rows x (5 + num_classes)`
    #[error("output tensor too small: expected {expected} values ({rows} rows x {stride}), got {actual}")]
    UndersizedOutput {
        expected: usize,
        actual: usize,
        rows: usize,
        stride: usize,
    },

    #[error("invalid tensor layout: {message}")]
    InvalidLayout { message: String },

    #[error("inference backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    #[error("failed to load tensor from '{path}': {message}")]
    Load { path: String, message: String },
}

impl DecodeError {
    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::InvalidLayout {
            message: message.into(),
        }
    }

    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

impl From<DecodeError> for ContractError {
    fn from(e: DecodeError) -> Self {
        ContractError::decode(e.to_string())
    }
}
