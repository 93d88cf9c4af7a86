//! Detection list to draw commands.

use contracts::{Detection, DrawCommand, Rgba};

use crate::palette::color_for;

/// Overlay styling, in surface pixels
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub line_width: f32,
    pub font_size: f32,
    pub chip_height: f32,
    /// Horizontal padding on each side of the label text
    pub text_padding: f32,
    /// Text baseline distance above the chip bottom
    pub baseline_offset: f32,
    /// Estimated glyph advance as a fraction of `font_size`
    pub glyph_advance: f32,
    pub text_color: Rgba,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_width: 2.0,
            font_size: 14.0,
            chip_height: 20.0,
            text_padding: 4.0,
            baseline_offset: 6.0,
            glyph_advance: 0.6,
            text_color: Rgba::WHITE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Build the commands for one overlay refresh.
    ///
    /// Always starts with [`DrawCommand::Clear`], so an empty list wipes the
    /// previous overlay. Boxes are clamped to the surface before scaling.
    pub fn render(&self, detections: &[Detection], width: u32, height: u32) -> Vec<DrawCommand> {
        let s = &self.style;
        let mut commands = Vec::with_capacity(1 + detections.len() * 3);
        commands.push(DrawCommand::Clear);

        for detection in detections {
            let (x, y, w, h) = detection.bbox.to_pixels(width, height);
            let color = color_for(&detection.label);
            let text = label_text(detection);
            let text_width = text.chars().count() as f32 * s.font_size * s.glyph_advance;
            let chip_width = text_width + 2.0 * s.text_padding;
            // chip sits above the box unless that would leave the surface
            let chip_x = x.min(width as f32 - chip_width).max(0.0);
            let chip_y = (y - s.chip_height).max(0.0);

            commands.push(DrawCommand::StrokeRect {
                x,
                y,
                width: w,
                height: h,
                color,
                line_width: s.line_width,
            });
            commands.push(DrawCommand::FillRect {
                x: chip_x,
                y: chip_y,
                width: chip_width,
                height: s.chip_height,
                color,
            });
            commands.push(DrawCommand::Text {
                x: chip_x + s.text_padding,
                y: chip_y + s.chip_height - s.baseline_offset,
                text,
                color: s.text_color,
                size_px: s.font_size,
            });
        }

        commands
    }
}

/// `"{label} {percent}%"`
pub fn label_text(detection: &Detection) -> String {
    format!("{} {}%", detection.label, detection.percent())
}
