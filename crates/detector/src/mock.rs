//! Time-driven mock detector used when no model is available.

use contracts::{BoundingBox, Detection, SharedClock};

pub struct MockDecoder {
    clock: SharedClock,
}

impl MockDecoder {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    pub fn decode(&self) -> Vec<Detection> {
        Self::detections_at(self.clock.now_ms() as f64 / 1000.0)
    }

    /// Deterministic detections for time `t` in seconds.
    ///
    /// A "person" box drifts on the left and is present while `sin(t/2) > 0`;
    /// a "cell phone" box drifts in the middle while `cos(0.7t) > 0.3`.
    pub fn detections_at(t: f64) -> Vec<Detection> {
        let mut detections = Vec::with_capacity(2);

        if (t * 0.5).sin() > 0.0 {
            detections.push(Detection::new(
                "person",
                (0.85 + t.sin() * 0.1) as f32,
                BoundingBox::Extent {
                    x: (0.2 + (t * 0.3).sin() * 0.1) as f32,
                    y: (0.1 + (t * 0.2).cos() * 0.05) as f32,
                    width: 0.3,
                    height: 0.6,
                },
            ));
        }

        if (t * 0.7).cos() > 0.3 {
            detections.push(Detection::new(
                "cell phone",
                (0.72 + (t * 1.2).cos() * 0.08) as f32,
                BoundingBox::Extent {
                    x: (0.5 + (t * 0.4).cos() * 0.15) as f32,
                    y: (0.3 + (t * 0.3).sin() * 0.1) as f32,
                    width: 0.15,
                    height: 0.25,
                },
            ));
        }

        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ManualClock;
    use std::f64::consts::PI;
    use std::sync::Arc;

    #[test]
    fn test_both_objects_visible() {
        let detections = MockDecoder::detections_at(1.0);
        let labels: Vec<_> = detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["person", "cell phone"]);
        for d in &detections {
            assert!((0.0..=1.0).contains(&d.score));
            let c = d.bbox.corners();
            assert!(c.xmax <= 1.0 && c.ymax <= 1.0);
        }
    }

    #[test]
    fn test_person_absent_half_cycle() {
        let detections = MockDecoder::detections_at(3.0 * PI);
        let labels: Vec<_> = detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["cell phone"]);
    }

    #[test]
    fn test_reads_clock() {
        let clock = Arc::new(ManualClock::new(1_000));
        let mock = MockDecoder::new(clock.clone());
        assert_eq!(mock.decode(), MockDecoder::detections_at(1.0));
        clock.set(3_000);
        assert_eq!(mock.decode(), MockDecoder::detections_at(3.0));
    }
}
