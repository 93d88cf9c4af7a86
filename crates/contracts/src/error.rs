//! Layered error definitions
//!
//! Categorized by source: media / channel / decode / correlation / signaling / config

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Media Errors =====
    /// No media source available (camera missing, permission denied)
    #[error("media acquisition error from '{source_name}': {message}")]
    Acquisition {
        source_name: String,
        message: String,
    },

    // ===== Channel Errors =====
    /// Message channel closed or unreachable
    #[error("channel '{channel}' error: {message}")]
    Channel { channel: String, message: String },

    // ===== Inference Errors =====
    /// Malformed inference output
    #[error("decode error: {message}")]
    Decode { message: String },

    /// Result references an evicted or unknown frame
    #[error("no frame record for '{frame_id}'")]
    CorrelationMiss { frame_id: String },

    // ===== Signaling Errors =====
    /// Handshake step failed
    #[error("signaling error in state '{state}': {message}")]
    Signaling { state: String, message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create media acquisition error
    pub fn acquisition(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Acquisition {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create channel error
    pub fn channel(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Channel {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn correlation_miss(frame_id: impl Into<String>) -> Self {
        Self::CorrelationMiss {
            frame_id: frame_id.into(),
        }
    }

    /// Create signaling error
    pub fn signaling(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Signaling {
            state: state.into(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error should trigger the reconnect policy
    pub fn is_channel(&self) -> bool {
        matches!(self, Self::Channel { .. })
    }
}
