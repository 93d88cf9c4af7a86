//! Message channel protocol
//!
//! JSON objects discriminated by a `type` field.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DetectionResult, FrameId};

/// Where inference runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// On-device decode
    #[default]
    #[serde(alias = "wasm")]
    Local,
    /// Frames are uploaded and results come back over the channel
    #[serde(alias = "server")]
    Remote,
}

impl InferenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque ICE candidate object, relayed untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IceCandidate(pub serde_json::Value);

/// Every message exchanged over the relay channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    /// client → server
    Offer { sdp: String },

    /// server → client
    Answer { sdp: String },

    /// both directions
    IceCandidate { candidate: IceCandidate },

    /// client → server, remote mode only
    Frame {
        frame_id: FrameId,
        capture_ts: u64,
        /// `data:image/jpeg;base64,...`
        image_data: String,
    },

    /// server → client
    Detections(DetectionResult),

    /// server → client
    Metrics { data: serde_json::Value },

    /// server → client
    Config { mode: InferenceMode },

    /// client → server, asks for a `metrics` reply
    MetricsRequest,
}

impl SignalMessage {
    /// Wire `type` tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::Frame { .. } => "frame",
            Self::Detections(_) => "detections",
            Self::Metrics { .. } => "metrics",
            Self::Config { .. } => "config",
            Self::MetricsRequest => "metrics-request",
        }
    }
}
