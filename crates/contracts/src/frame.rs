//! Frame types - capture output and per-frame lifecycle record.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Detection, FrameId};

/// Raw pixels handed over by a media source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    pub width: u32,

    pub height: u32,

    /// Pixel layout
    pub format: ImageFormat,

    /// Tightly packed pixel rows (zero-copy)
    pub data: Bytes,
}

impl ImageData {
    /// Byte length implied by the dimensions and format
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Whether the buffer holds at least one full frame of pixels
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() >= self.expected_len()
    }
}

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Rgb8,
    Rgba8,
    Bgra8,
}

impl ImageFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

/// Lifecycle record of one captured frame.
///
/// Created at capture with only `capture_ts` set; the remaining timestamps
/// are filled as the frame moves through dispatch, inference and display.
/// All timestamps are wall-clock milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_id: FrameId,

    /// Capture sequence number within the session
    pub seq: u64,

    pub capture_ts: u64,

    #[serde(default)]
    pub recv_ts: Option<u64>,

    #[serde(default)]
    pub inference_ts: Option<u64>,

    #[serde(default)]
    pub display_ts: Option<u64>,

    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl FrameRecord {
    /// Fresh record for a frame captured at `capture_ts`
    pub fn captured(frame_id: FrameId, seq: u64, capture_ts: u64) -> Self {
        Self {
            frame_id,
            seq,
            capture_ts,
            recv_ts: None,
            inference_ts: None,
            display_ts: None,
            detections: Vec::new(),
        }
    }

    /// A displayed record is frozen until evicted
    pub fn is_displayed(&self) -> bool {
        self.display_ts.is_some()
    }

    /// End-to-end latency (`display_ts - capture_ts`), never negative
    pub fn e2e_latency_ms(&self) -> Option<u64> {
        self.display_ts
            .map(|display| display.saturating_sub(self.capture_ts))
    }
}
