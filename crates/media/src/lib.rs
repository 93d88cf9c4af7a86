//! # Media
//!
//! Media source implementations and frame conversion.
//!
//! Responsibilities:
//! - Synthetic camera implementing `MediaSource`
//! - Normalize source pixel layouts to RGBA
//! - Downscale to the fixed capture resolution
//! - JPEG / data-URL encoding for remote upload
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::MediaSource;
//! use media::{downscale, encode_data_url, SyntheticCamera};
//!
//! let mut camera = SyntheticCamera::with_size(1280, 720);
//! camera.start()?;
//! if let Some(frame) = camera.latest_frame() {
//!     let small = downscale(&frame, 320, 240)?;
//!     let url = encode_data_url(&small, 80)?;
//! }
//! ```

mod convert;
mod error;
mod synthetic;

pub use convert::{
    decode_data_url, downscale, encode_data_url, encode_jpeg, to_rgba, JPEG_DATA_URL_PREFIX,
};
pub use error::{MediaError, Result};
pub use synthetic::{SyntheticCamera, SyntheticCameraConfig};
