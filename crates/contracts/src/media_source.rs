//! MediaSource trait - live video source abstraction
//!
//! Camera negotiation and permission handling live outside the core; the
//! session only asks a source to start, samples its latest pixels on each
//! capture tick and releases it on stop.

use crate::{ContractError, ImageData};

/// Live video source
pub trait MediaSource: Send {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Acquire the device.
    ///
    /// # Errors
    /// Returns `ContractError::Acquisition` when no media is available.
    /// The core does not retry; retry is a user action.
    fn start(&mut self) -> Result<(), ContractError>;

    /// Latest decoded frame, or `None` while no pixels are available yet
    /// (e.g. stream metadata not known). Never blocks.
    fn latest_frame(&mut self) -> Option<ImageData>;

    /// Release the device. Idempotent.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}
