//! Synthetic camera
//!
//! Stand-in media source for runs without a camera: renders a gradient with
//! a moving block so downstream stages see changing content.

use std::sync::Arc;

use bytes::Bytes;
use contracts::{ContractError, ImageData, ImageFormat, MediaSource, SharedClock, SystemClock};
use tracing::{debug, trace};

/// Synthetic camera configuration
#[derive(Debug, Clone)]
pub struct SyntheticCameraConfig {
    pub name: String,

    /// Source resolution (before downscale)
    pub width: u32,

    pub height: u32,

    pub format: ImageFormat,

    /// Polls answered with `None` after start, simulating stream metadata
    /// that is not yet available
    pub warmup_polls: u32,

    /// When false, `start` fails with an acquisition error
    pub available: bool,
}

impl Default for SyntheticCameraConfig {
    fn default() -> Self {
        Self {
            name: "synthetic_camera".to_string(),
            width: 640,
            height: 480,
            format: ImageFormat::Bgra8,
            warmup_polls: 0,
            available: true,
        }
    }
}

/// Clock-driven synthetic video source
pub struct SyntheticCamera {
    config: SyntheticCameraConfig,
    clock: SharedClock,
    active: bool,
    polls: u64,
    frames_produced: u64,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticCameraConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            active: false,
            polls: 0,
            frames_produced: 0,
        }
    }

    /// Camera at the given source resolution on the system clock
    pub fn with_size(width: u32, height: u32) -> Self {
        Self::new(
            SyntheticCameraConfig {
                width,
                height,
                ..Default::default()
            },
            Arc::new(SystemClock),
        )
    }

    /// A device that cannot be acquired
    pub fn unavailable(name: &str) -> Self {
        Self::new(
            SyntheticCameraConfig {
                name: name.to_string(),
                available: false,
                ..Default::default()
            },
            Arc::new(SystemClock),
        )
    }

    pub fn frames_produced(&self) -> u64 {
        self.frames_produced
    }

    fn render(&self, now_ms: u64) -> Bytes {
        let (w, h) = (self.config.width as usize, self.config.height as usize);
        let bpp = self.config.format.bytes_per_pixel();
        let t = now_ms as f64 / 1000.0;

        let block = (h / 4).max(1);
        let travel = w.saturating_sub(block) as f64;
        let bx = (travel * (0.5 + 0.5 * (t * 0.8).sin())) as usize;
        let by = (h.saturating_sub(block) as f64 * (0.5 + 0.5 * (t * 0.5).cos())) as usize;
        let phase = ((t * 40.0) as u64 % 256) as u8;

        let mut data = vec![0u8; w * h * bpp];
        for (i, px) in data.chunks_exact_mut(bpp).enumerate() {
            let (x, y) = (i % w, i / w);
            let in_block = (bx..bx + block).contains(&x) && (by..by + block).contains(&y);
            let (r, g, b) = if in_block {
                (255, 255, 255)
            } else {
                ((x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, phase)
            };
            match self.config.format {
                ImageFormat::Rgb8 => px.copy_from_slice(&[r, g, b]),
                ImageFormat::Rgba8 => px.copy_from_slice(&[r, g, b, 255]),
                ImageFormat::Bgra8 => px.copy_from_slice(&[b, g, r, 255]),
            }
        }
        Bytes::from(data)
    }
}

impl MediaSource for SyntheticCamera {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn start(&mut self) -> Result<(), ContractError> {
        if !self.config.available {
            return Err(ContractError::acquisition(
                &self.config.name,
                "no camera device available",
            ));
        }
        self.active = true;
        self.polls = 0;
        debug!(
            source = %self.config.name,
            width = self.config.width,
            height = self.config.height,
            "synthetic camera started"
        );
        Ok(())
    }

    fn latest_frame(&mut self) -> Option<ImageData> {
        if !self.active {
            return None;
        }
        self.polls += 1;
        if self.polls <= u64::from(self.config.warmup_polls) {
            trace!(source = %self.config.name, poll = self.polls, "metadata not ready");
            return None;
        }

        self.frames_produced += 1;
        Some(ImageData {
            width: self.config.width,
            height: self.config.height,
            format: self.config.format,
            data: self.render(self.clock.now_ms()),
        })
    }

    fn stop(&mut self) {
        if self.active {
            debug!(
                source = %self.config.name,
                frames = self.frames_produced,
                "synthetic camera stopped"
            );
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
