//! # Detector
//!
//! Object detection over captured frames.
//!
//! - [`decode_output`]: fixed-layout tensor decode with two-stage thresholds
//! - [`preprocess`]: resize and CHW normalization for the model input
//! - [`Decoder`]: model-backed decode, or the time-driven mock when no model loads
//! - [`Detector`]: async front that never runs two decodes at once

mod backend;
mod classes;
mod decoder;
mod detector;
mod error;
mod mock;
mod preprocess;
mod tensor;

pub use backend::{InferenceBackend, TensorReplayBackend};
pub use classes::{class_index, class_label, COCO_CLASSES};
pub use decoder::{Decoder, ModelDecoder};
pub use detector::Detector;
pub use error::DecodeError;
pub use mock::MockDecoder;
pub use preprocess::preprocess;
pub use tensor::{decode_output, TensorLayout, Thresholds};
