//! # Overlay
//!
//! Turns detections into [`DrawCommand`](contracts::DrawCommand)s and
//! provides surfaces that execute them.

mod error;
mod palette;
mod renderer;
mod surface;

pub use error::{OverlayError, Result};
pub use palette::{color_for, palette_color, PALETTE};
pub use renderer::{label_text, OverlayRenderer, OverlayStyle};
pub use surface::{ImageSurface, RecordingSurface};
