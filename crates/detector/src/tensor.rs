//! Raw-tensor decode for the fixed YOLOv5-style output layout.
//!
//! Each row holds `[cx, cy, w, h, objectness, class_0 .. class_n]`, with box
//! parameters in model-input pixels. There is no non-maximum suppression:
//! overlapping rows for one object all come through.

use contracts::{BoundingBox, Detection, ModelConfig};

use crate::classes::class_label;
use crate::error::DecodeError;

/// Box parameters before the objectness column
const BOX_PARAMS: usize = 4;

/// Output layout of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorLayout {
    pub rows: usize,
    pub num_classes: usize,
    /// Square model input edge in pixels
    pub input_size: u32,
}

impl Default for TensorLayout {
    fn default() -> Self {
        Self {
            rows: 25200,
            num_classes: 80,
            input_size: 640,
        }
    }
}

impl TensorLayout {
    pub fn from_config(model: &ModelConfig) -> Self {
        Self {
            rows: model.rows,
            num_classes: model.num_classes,
            input_size: model.input_size,
        }
    }

    /// Values per row
    pub fn stride(&self) -> usize {
        BOX_PARAMS + 1 + self.num_classes
    }

    pub fn expected_len(&self) -> usize {
        self.rows * self.stride()
    }
}

/// Two-stage acceptance thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Rows below this objectness are rejected before class scoring
    pub objectness: f32,
    /// Rows whose `objectness x max_class_score` is below this are rejected
    pub score: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            objectness: 0.5,
            score: 0.3,
        }
    }
}

impl Thresholds {
    pub fn from_config(model: &ModelConfig) -> Self {
        Self {
            objectness: model.objectness_threshold,
            score: model.score_threshold,
        }
    }
}

/// Decode a flat output tensor into normalized detections.
///
/// # Errors
/// `UndersizedOutput` when the buffer holds fewer than `rows x stride`
/// values, `InvalidLayout` for a zero input size or class count.
pub fn decode_output(
    output: &[f32],
    layout: &TensorLayout,
    thresholds: &Thresholds,
    classes: &[&str],
) -> Result<Vec<Detection>, DecodeError> {
    if layout.num_classes == 0 || layout.input_size == 0 {
        return Err(DecodeError::invalid_layout(format!(
            "num_classes={} input_size={}",
            layout.num_classes, layout.input_size
        )));
    }
    let stride = layout.stride();
    let expected = layout.expected_len();
    if output.len() < expected {
        return Err(DecodeError::UndersizedOutput {
            expected,
            actual: output.len(),
            rows: layout.rows,
            stride,
        });
    }

    let size = layout.input_size as f32;
    let mut detections = Vec::new();

    for row in output[..expected].chunks_exact(stride) {
        let objectness = row[BOX_PARAMS];
        // negated so NaN rejects too
        if !(objectness >= thresholds.objectness) {
            continue;
        }

        let (class_id, max_class_score) = row[BOX_PARAMS + 1..]
            .iter()
            .enumerate()
            .fold((0usize, 0.0f32), |(best_id, best), (id, &score)| {
                if score > best {
                    (id, score)
                } else {
                    (best_id, best)
                }
            });

        let score = objectness * max_class_score;
        if !(score >= thresholds.score) {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        detections.push(Detection::new(
            class_label(classes, class_id),
            score,
            BoundingBox::Extent {
                x: (cx - w / 2.0) / size,
                y: (cy - h / 2.0) / size,
                width: w / size,
                height: h / size,
            },
        ));
    }

    Ok(detections)
}
