//! Detection types shared by local decode, remote results and the overlay.

use serde::{Deserialize, Serialize};

use crate::FrameId;

/// One predicted object instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class name (COCO vocabulary locally, opaque string remotely)
    pub label: String,

    /// Confidence in [0, 1]
    pub score: f32,

    #[serde(flatten)]
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, score: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            score,
            bbox,
        }
    }

    /// Score as an integer percentage 0-100 for display
    pub fn percent(&self) -> u8 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Normalized box in either of the two wire representations.
///
/// Remote results carry corner form; local decode emits extent form.
/// Consumers call [`BoundingBox::corners`] to get one clamped shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundingBox {
    Corners {
        xmin: f32,
        ymin: f32,
        xmax: f32,
        ymax: f32,
    },
    Extent {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Clamped corner-form box, guaranteed `xmin <= xmax` and `ymin <= ymax`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl Corners {
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }
}

impl BoundingBox {
    /// Convert to corner form, clamp into [0, 1] and order each axis.
    pub fn corners(&self) -> Corners {
        let (x0, y0, x1, y1) = match *self {
            Self::Corners {
                xmin,
                ymin,
                xmax,
                ymax,
            } => (xmin, ymin, xmax, ymax),
            Self::Extent {
                x,
                y,
                width,
                height,
            } => (x, y, x + width, y + height),
        };
        let (x0, x1) = ordered(clamp_unit(x0), clamp_unit(x1));
        let (y0, y1) = ordered(clamp_unit(y0), clamp_unit(y1));
        Corners {
            xmin: x0,
            ymin: y0,
            xmax: x1,
            ymax: y1,
        }
    }

    /// Denormalize to `(x, y, width, height)` in surface pixels
    pub fn to_pixels(&self, surface_width: u32, surface_height: u32) -> (f32, f32, f32, f32) {
        let c = self.corners();
        let (w, h) = (surface_width as f32, surface_height as f32);
        (c.xmin * w, c.ymin * h, c.width() * w, c.height() * h)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Inference result for one frame, as carried by the `detections` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub frame_id: FrameId,

    pub capture_ts: u64,

    pub recv_ts: u64,

    pub inference_ts: u64,

    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_to_corners() {
        let bbox = BoundingBox::Extent {
            x: 0.25,
            y: 0.5,
            width: 0.5,
            height: 0.25,
        };
        let c = bbox.corners();
        assert_eq!(c.xmin, 0.25);
        assert_eq!(c.xmax, 0.75);
        assert_eq!(c.ymin, 0.5);
        assert_eq!(c.ymax, 0.75);
    }

    #[test]
    fn test_corners_are_clamped_and_ordered() {
        let bbox = BoundingBox::Corners {
            xmin: 0.9,
            ymin: -0.2,
            xmax: 0.1,
            ymax: 1.4,
        };
        let c = bbox.corners();
        assert!(c.xmin <= c.xmax);
        assert_eq!((c.xmin, c.xmax), (0.1, 0.9));
        assert_eq!((c.ymin, c.ymax), (0.0, 1.0));
    }

    #[test]
    fn test_percent() {
        let d = Detection::new(
            "person",
            0.846,
            BoundingBox::Extent {
                x: 0.0,
                y: 0.0,
                width: 0.1,
                height: 0.1,
            },
        );
        assert_eq!(d.percent(), 85);
    }

    #[test]
    fn test_parse_both_box_forms() {
        let corners: Detection = serde_json::from_str(
            r#"{"label":"cup","score":0.5,"xmin":0.1,"ymin":0.2,"xmax":0.3,"ymax":0.4}"#,
        )
        .unwrap();
        assert!(matches!(corners.bbox, BoundingBox::Corners { .. }));

        let extent: Detection = serde_json::from_str(
            r#"{"label":"cup","score":0.5,"x":0.1,"y":0.2,"width":0.3,"height":0.4}"#,
        )
        .unwrap();
        assert!(matches!(extent.bbox, BoundingBox::Extent { .. }));
        assert_eq!(extent.bbox.to_pixels(100, 100).2.round(), 30.0);
    }
}
