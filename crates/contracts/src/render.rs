//! Rendering surface contract

use serde::{Deserialize, Serialize};

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    /// Parse `#RRGGBB`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self([channel(0)?, channel(2)?, channel(4)?, 255]))
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }
}

/// One drawing operation in surface pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Wipe the whole overlay
    Clear,
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
        line_width: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
    },
    /// `(x, y)` is the text baseline origin
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Rgba,
        size_px: f32,
    },
}

/// Overlay target accepting draw commands
pub trait RenderSurface: Send {
    /// Surface size in pixels `(width, height)`
    fn size(&self) -> (u32, u32);

    /// Execute commands in order
    fn apply(&mut self, commands: &[DrawCommand]);
}
