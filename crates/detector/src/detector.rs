//! Async, non-reentrant front for a [`Decoder`].

use std::sync::Arc;

use contracts::Detection;
use image::RgbaImage;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

use crate::decoder::Decoder;

/// Cheap to clone; all clones share one decoder and one in-flight slot.
#[derive(Clone)]
pub struct Detector {
    inner: Arc<Mutex<Decoder>>,
    kind: &'static str,
}

impl Detector {
    pub fn new(decoder: Decoder) -> Self {
        let kind = decoder.kind();
        Self {
            inner: Arc::new(Mutex::new(decoder)),
            kind,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    /// Run one decode off the async runtime.
    ///
    /// Returns an empty list without waiting if a decode is already running,
    /// and an empty list (logged) if decoding fails.
    #[instrument(name = "detector_detect", skip(self, image), fields(kind = self.kind))]
    pub async fn detect(&self, image: RgbaImage) -> Vec<Detection> {
        let Ok(mut decoder) = Arc::clone(&self.inner).try_lock_owned() else {
            debug!("Decode already in flight, skipping frame");
            return Vec::new();
        };

        match tokio::task::spawn_blocking(move || decoder.decode(&image)).await {
            Ok(Ok(detections)) => detections,
            Ok(Err(e)) => {
                warn!(error = %e, "Decode failed, treating frame as empty");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Decode task aborted");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("kind", &self.kind)
            .field("busy", &self.is_busy())
            .finish()
    }
}
