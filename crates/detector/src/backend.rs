//! Inference backends.
//!
//! A backend takes a preprocessed `[1, 3, S, S]` input and returns the raw
//! flat output tensor. `TensorReplayBackend` replays a recorded output from
//! disk (little-endian `f32`), which stands in for a model runtime when
//! testing the decode path end to end.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::DecodeError;

pub trait InferenceBackend: Send {
    fn name(&self) -> &str;

    /// Run one forward pass over a CHW input of edge `input_size`
    fn run(&mut self, input: &[f32], input_size: u32) -> Result<Vec<f32>, DecodeError>;
}

pub struct TensorReplayBackend {
    source: Option<PathBuf>,
    output: Vec<f32>,
}

impl TensorReplayBackend {
    /// Load a recorded output tensor.
    ///
    /// # Errors
    /// `Load` if the file is unreadable, empty, or not a whole number of `f32`s.
    pub fn load(path: &Path) -> Result<Self, DecodeError> {
        let load_err = |message: String| DecodeError::Load {
            path: path.display().to_string(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| load_err(e.to_string()))?;
        if bytes.is_empty() || bytes.len() % 4 != 0 {
            return Err(load_err(format!(
                "length {} is not a non-zero multiple of 4",
                bytes.len()
            )));
        }

        let output: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        debug!(path = %path.display(), values = output.len(), "Loaded replay tensor");

        Ok(Self {
            source: Some(path.to_path_buf()),
            output,
        })
    }

    pub fn from_values(output: Vec<f32>) -> Self {
        Self {
            source: None,
            output,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl InferenceBackend for TensorReplayBackend {
    fn name(&self) -> &str {
        "tensor-replay"
    }

    fn run(&mut self, input: &[f32], input_size: u32) -> Result<Vec<f32>, DecodeError> {
        let side = input_size as usize;
        if input.len() != 3 * side * side {
            return Err(DecodeError::backend(
                self.name(),
                format!(
                    "input has {} values, expected 3x{input_size}x{input_size}",
                    input.len()
                ),
            ));
        }
        Ok(self.output.clone())
    }
}
