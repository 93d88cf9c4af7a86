//! Decoder selection: a real model path or the mock fallback.

use contracts::{Detection, ModelConfig, SharedClock};
use image::RgbaImage;
use tracing::{info, warn};

use crate::backend::{InferenceBackend, TensorReplayBackend};
use crate::classes::COCO_CLASSES;
use crate::error::DecodeError;
use crate::mock::MockDecoder;
use crate::preprocess::preprocess;
use crate::tensor::{decode_output, TensorLayout, Thresholds};

/// Preprocess, forward pass, tensor decode
pub struct ModelDecoder {
    backend: Box<dyn InferenceBackend>,
    layout: TensorLayout,
    thresholds: Thresholds,
}

impl ModelDecoder {
    pub fn new(
        backend: Box<dyn InferenceBackend>,
        layout: TensorLayout,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            backend,
            layout,
            thresholds,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn decode(&mut self, image: &RgbaImage) -> Result<Vec<Detection>, DecodeError> {
        let input = preprocess(image, self.layout.input_size);
        let output = self.backend.run(&input, self.layout.input_size)?;
        decode_output(&output, &self.layout, &self.thresholds, &COCO_CLASSES)
    }
}

pub enum Decoder {
    Model(ModelDecoder),
    Mock(MockDecoder),
}

impl Decoder {
    pub fn mock(clock: SharedClock) -> Self {
        Self::Mock(MockDecoder::new(clock))
    }

    /// Build from config. A configured tensor that fails to load degrades to
    /// the mock decoder instead of failing the session.
    pub fn from_config(model: &ModelConfig, clock: SharedClock) -> Self {
        let Some(path) = &model.tensor_path else {
            info!("No model configured, using mock detector");
            return Self::mock(clock);
        };

        match TensorReplayBackend::load(path) {
            Ok(backend) => {
                info!(path = %path.display(), "Model backend loaded");
                Self::Model(ModelDecoder::new(
                    Box::new(backend),
                    TensorLayout::from_config(model),
                    Thresholds::from_config(model),
                ))
            }
            Err(e) => {
                warn!(error = %e, "Model backend failed to load, falling back to mock detector");
                Self::mock(clock)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Mock(_) => "mock",
        }
    }

    pub fn decode(&mut self, image: &RgbaImage) -> Result<Vec<Detection>, DecodeError> {
        match self {
            Self::Model(model) => model.decode(image),
            Self::Mock(mock) => Ok(mock.decode()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ManualClock;
    use std::io::Write;
    use std::sync::Arc;

    fn clock() -> SharedClock {
        Arc::new(ManualClock::new(1_000))
    }

    #[test]
    fn test_no_model_uses_mock() {
        let decoder = Decoder::from_config(&ModelConfig::default(), clock());
        assert_eq!(decoder.kind(), "mock");
    }

    #[test]
    fn test_bad_model_falls_back() {
        let model = ModelConfig {
            tensor_path: Some("/nonexistent/output.bin".into()),
            ..ModelConfig::default()
        };
        let mut decoder = Decoder::from_config(&model, clock());
        assert_eq!(decoder.kind(), "mock");
        let detections = decoder.decode(&RgbaImage::new(4, 4)).unwrap();
        assert_eq!(detections, MockDecoder::detections_at(1.0));
    }

    #[test]
    fn test_replay_model_end_to_end() {
        // two rows, two classes: one accepted, one rejected
        let values: [f32; 14] = [
            16.0, 16.0, 8.0, 8.0, 0.95, 0.1, 0.9, //
            0.0, 0.0, 4.0, 4.0, 0.2, 1.0, 0.0,
        ];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for v in values {
            file.write_all(&v.to_le_bytes()).unwrap();
        }

        let model = ModelConfig {
            input_size: 32,
            rows: 2,
            num_classes: 2,
            tensor_path: Some(file.path().to_path_buf()),
            ..ModelConfig::default()
        };
        let mut decoder = Decoder::from_config(&model, clock());
        assert_eq!(decoder.kind(), "model");

        let detections = decoder.decode(&RgbaImage::new(64, 48)).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "bicycle");
        let c = detections[0].bbox.corners();
        assert!((c.xmin - 0.375).abs() < 1e-5);
        assert!((c.xmax - 0.625).abs() < 1e-5);
    }

    #[test]
    fn test_model_undersized_output_is_error() {
        let model = ModelDecoder::new(
            Box::new(TensorReplayBackend::from_values(vec![0.0; 3])),
            TensorLayout {
                rows: 1,
                num_classes: 1,
                input_size: 8,
            },
            Thresholds::default(),
        );
        let mut decoder = Decoder::Model(model);
        assert!(matches!(
            decoder.decode(&RgbaImage::new(8, 8)),
            Err(DecodeError::UndersizedOutput { .. })
        ));
    }
}
