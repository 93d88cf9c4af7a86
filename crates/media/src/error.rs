//! Media error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    /// Pixel buffer does not match its declared dimensions
    #[error("malformed frame {width}x{height}: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Target size is zero in one dimension
    #[error("invalid target size {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },

    /// Image encoding failed
    #[error("failed to encode frame: {message}")]
    Encode { message: String },
}

pub type Result<T> = std::result::Result<T, MediaError>;
