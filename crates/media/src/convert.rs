//! Frame conversion: normalize pixel layout, downscale, encode for upload.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use contracts::{ImageData, ImageFormat};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, RgbImage, RgbaImage};

use crate::error::{MediaError, Result};

/// Prefix of the `image_data` field in outbound `frame` messages
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Copy a source frame into an RGBA buffer, whatever its pixel layout.
pub fn to_rgba(frame: &ImageData) -> Result<RgbaImage> {
    let malformed = || MediaError::MalformedFrame {
        width: frame.width,
        height: frame.height,
        expected: frame.expected_len(),
        actual: frame.data.len(),
    };
    if !frame.is_well_formed() {
        return Err(malformed());
    }

    let pixels = &frame.data[..frame.expected_len()];
    let rgba: Vec<u8> = match frame.format {
        ImageFormat::Rgba8 => pixels.to_vec(),
        ImageFormat::Bgra8 => pixels
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0], p[3]])
            .collect(),
        ImageFormat::Rgb8 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
    };
    RgbaImage::from_raw(frame.width, frame.height, rgba).ok_or_else(malformed)
}

/// Downscale a source frame to the fixed capture resolution.
///
/// The output size is always `width x height`, independent of the source.
pub fn downscale(frame: &ImageData, width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidTarget { width, height });
    }
    let source = to_rgba(frame)?;
    if source.dimensions() == (width, height) {
        return Ok(source);
    }
    Ok(imageops::resize(&source, width, height, FilterType::Triangle))
}

/// Lossy JPEG encoding (alpha dropped)
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb: RgbImage = image.convert();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| MediaError::Encode {
            message: e.to_string(),
        })?;
    Ok(out)
}

/// `data:image/jpeg;base64,...` for the `frame` message
pub fn encode_data_url(image: &RgbaImage, quality: u8) -> Result<String> {
    let jpeg = encode_jpeg(image, quality)?;
    Ok(format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode(jpeg)))
}

/// Inverse of [`encode_data_url`]; `None` if the prefix or payload is invalid
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let payload = url.strip_prefix(JPEG_DATA_URL_PREFIX)?;
    STANDARD.decode(payload).ok()
}
