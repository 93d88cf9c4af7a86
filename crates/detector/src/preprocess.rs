//! Model input preparation

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Resize to `input_size x input_size` and lay out as planar RGB
/// (`[1, 3, S, S]`, CHW) scaled to [0, 1].
pub fn preprocess(image: &RgbaImage, input_size: u32) -> Vec<f32> {
    let resized = imageops::resize(image, input_size, input_size, FilterType::Triangle);
    let side = input_size as usize;
    let plane = side * side;
    let mut tensor = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let i = y as usize * side + x as usize;
        let [r, g, b, _] = pixel.0;
        tensor[i] = r as f32 / 255.0;
        tensor[plane + i] = g as f32 / 255.0;
        tensor[2 * plane + i] = b as f32 / 255.0;
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_planar_layout() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 51, 255]));
        let tensor = preprocess(&image, 4);
        assert_eq!(tensor.len(), 3 * 16);
        assert!(tensor[..16].iter().all(|v| (*v - 1.0).abs() < 1e-6));
        assert!(tensor[16..32].iter().all(|v| v.abs() < 1e-6));
        assert!(tensor[32..].iter().all(|v| (*v - 0.2).abs() < 1e-6));
    }
}
