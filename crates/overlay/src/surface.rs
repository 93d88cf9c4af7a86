//! Render surfaces: an in-memory RGBA image and a command recorder.

use std::path::Path;

use contracts::{DrawCommand, RenderSurface, Rgba as Color};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::{debug, trace};

use crate::error::Result;

/// Rasterizes boxes and label chips into an RGBA buffer.
///
/// No font is bundled, so `Text` commands are skipped; the chip still marks
/// where the label goes.
pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        debug!(path = %path.display(), "Overlay written");
        Ok(())
    }

    fn stroke(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, line_width: f32) {
        let passes = line_width.round().max(1.0) as i32;
        for inset in 0..passes {
            let inset_f = inset as f32;
            if let Some(rect) = rect(
                x + inset_f,
                y + inset_f,
                width - 2.0 * inset_f,
                height - 2.0 * inset_f,
            ) {
                draw_hollow_rect_mut(&mut self.image, rect, Rgba(color.0));
            }
        }
    }
}

impl RenderSurface for ImageSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn apply(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            match command {
                DrawCommand::Clear => {
                    self.image.pixels_mut().for_each(|p| *p = Rgba(Color::TRANSPARENT.0));
                }
                DrawCommand::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                    line_width,
                } => self.stroke(*x, *y, *width, *height, *color, *line_width),
                DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    if let Some(rect) = rect(*x, *y, *width, *height) {
                        draw_filled_rect_mut(&mut self.image, rect, Rgba(color.0));
                    }
                }
                DrawCommand::Text { text, .. } => {
                    trace!(text = %text, "Text skipped, no font available");
                }
            }
        }
    }
}

/// imageproc rejects zero-sized rects
fn rect(x: f32, y: f32, width: f32, height: f32) -> Option<Rect> {
    let (w, h) = (width.round(), height.round());
    if !(w >= 1.0 && h >= 1.0) {
        return None;
    }
    Some(Rect::at(x.round() as i32, y.round() as i32).of_size(w as u32, h as u32))
}

/// Keeps the most recent batch of commands; used headless and in tests.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    last: Vec<DrawCommand>,
    batches: usize,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            last: Vec::new(),
            batches: 0,
        }
    }

    pub fn last_commands(&self) -> &[DrawCommand] {
        &self.last
    }

    /// Number of `apply` calls so far
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Boxes currently on screen
    pub fn box_count(&self) -> usize {
        self.last
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokeRect { .. }))
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn apply(&mut self, commands: &[DrawCommand]) {
        self.last = commands.to_vec();
        self.batches += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::OverlayRenderer;
    use contracts::{BoundingBox, Detection};

    fn detection() -> Detection {
        Detection::new(
            "person",
            0.9,
            BoundingBox::Corners {
                xmin: 0.25,
                ymin: 0.5,
                xmax: 0.75,
                ymax: 0.9,
            },
        )
    }

    #[test]
    fn test_image_surface_draws_and_clears() {
        let mut surface = ImageSurface::new(100, 100);
        let renderer = OverlayRenderer::default();

        surface.apply(&renderer.render(&[detection()], 100, 100));
        let stroke = surface.image().get_pixel(25, 70);
        assert_eq!(stroke.0, crate::palette::color_for("person").0);
        // inside the box stays transparent
        assert_eq!(surface.image().get_pixel(50, 70).0[3], 0);

        surface.apply(&renderer.render(&[], 100, 100));
        assert!(surface.image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_degenerate_box_is_ignored() {
        let mut surface = ImageSurface::new(10, 10);
        surface.apply(&[DrawCommand::FillRect {
            x: 2.0,
            y: 2.0,
            width: 0.0,
            height: 5.0,
            color: Color::WHITE,
        }]);
        assert!(surface.image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.png");
        let mut surface = ImageSurface::new(32, 24);
        surface.apply(&OverlayRenderer::default().render(&[detection()], 32, 24));
        surface.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (32, 24));
    }

    #[test]
    fn test_recording_surface() {
        let mut surface = RecordingSurface::new(320, 240);
        let renderer = OverlayRenderer::default();
        surface.apply(&renderer.render(&[detection(), detection()], 320, 240));
        assert_eq!(surface.box_count(), 2);
        surface.apply(&renderer.render(&[], 320, 240));
        assert_eq!(surface.box_count(), 0);
        assert_eq!(surface.batches(), 2);
    }
}
