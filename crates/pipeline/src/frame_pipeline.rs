//! Frame Pipeline: capture, dispatch, result correlation.
//!
//! All methods run on the session's event loop; results are matched to
//! their frame by `frame_id` only, never by arrival order.

use contracts::{
    CaptureConfig, Detection, DetectionResult, FrameId, FrameRecord, InferenceMode, MediaSource,
    MetricsConfig, RenderSurface, SharedClock, SignalMessage,
};
use image::RgbaImage;
use media::{downscale, encode_data_url, MediaError};
use observability::{metrics as prom, DropReason, MetricsEngine};
use overlay::OverlayRenderer;
use tracing::{debug, instrument, trace, warn};

use crate::store::FrameStore;

/// Pipeline settings taken from the session configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    pub store_capacity: usize,
    pub latency_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            jpeg_quality: 80,
            store_capacity: 100,
            latency_window: 100,
        }
    }
}

impl PipelineConfig {
    pub fn from_config(capture: &CaptureConfig, metrics: &MetricsConfig) -> Self {
        Self {
            width: capture.width,
            height: capture.height,
            jpeg_quality: capture.jpeg_quality,
            store_capacity: metrics.store_capacity,
            latency_window: metrics.latency_window,
        }
    }
}

/// A downscaled frame whose record is already in the store
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame_id: FrameId,
    pub capture_ts: u64,
    pub image: RgbaImage,
}

/// Where a captured frame goes next
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Run the local detector, then call [`FramePipeline::on_local_result`]
    Local {
        frame_id: FrameId,
        capture_ts: u64,
        image: RgbaImage,
    },
    /// Send over the signaling channel; the result arrives as a message
    Remote(SignalMessage),
}

/// What `on_result` did with a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    Applied { latency_ms: u64 },
    /// Frame unknown or already evicted
    Unknown,
    /// Frame already displayed; records are frozen after display
    Duplicate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub captured: u64,
    pub dropped: u64,
    pub applied: u64,
    pub correlation_misses: u64,
    pub duplicates: u64,
}

pub struct FramePipeline<S: RenderSurface> {
    clock: SharedClock,
    config: PipelineConfig,
    next_seq: u64,
    store: FrameStore,
    metrics: MetricsEngine,
    renderer: OverlayRenderer,
    surface: S,
    stats: PipelineStats,
}

impl<S: RenderSurface> FramePipeline<S> {
    pub fn new(config: PipelineConfig, clock: SharedClock, surface: S) -> Self {
        Self {
            store: FrameStore::new(config.store_capacity),
            metrics: MetricsEngine::new(clock.clone(), config.latency_window),
            renderer: OverlayRenderer::default(),
            next_seq: 0,
            clock,
            config,
            surface,
            stats: PipelineStats::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: OverlayRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Sample the source into a fixed-size frame and create its record.
    ///
    /// Returns `None` (frame dropped, not queued) when the source has no
    /// pixels yet or the pixels can't be converted.
    #[instrument(name = "pipeline_capture", skip(self, source), fields(source = source.name()))]
    pub fn capture(&mut self, source: &mut dyn MediaSource) -> Option<CapturedFrame> {
        let Some(raw) = source.latest_frame() else {
            trace!("Source has no frame yet, dropping tick");
            self.drop_frame(DropReason::NoFrame);
            return None;
        };

        let image = match downscale(&raw, self.config.width, self.config.height) {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Frame conversion failed, dropping tick");
                self.drop_frame(DropReason::NoFrame);
                return None;
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let frame_id = FrameId::from_sequence(seq);
        let capture_ts = self.clock.now_ms();

        if let Some(evicted) = self
            .store
            .insert(FrameRecord::captured(frame_id.clone(), seq, capture_ts))
        {
            trace!(frame_id = %evicted.frame_id, "Evicted oldest frame record");
        }

        self.stats.captured += 1;
        prom::record_frame_captured();

        Some(CapturedFrame {
            frame_id,
            capture_ts,
            image,
        })
    }

    /// Route a captured frame by mode.
    ///
    /// Local frames get `recv_ts = capture_ts` (no network hop). Remote
    /// frames are JPEG-encoded into a `frame` message.
    pub fn dispatch(
        &mut self,
        frame: CapturedFrame,
        mode: InferenceMode,
    ) -> Result<Dispatch, MediaError> {
        match mode {
            InferenceMode::Local => {
                if let Some(record) = self.store.get_mut(&frame.frame_id) {
                    record.recv_ts = Some(frame.capture_ts);
                }
                Ok(Dispatch::Local {
                    frame_id: frame.frame_id,
                    capture_ts: frame.capture_ts,
                    image: frame.image,
                })
            }
            InferenceMode::Remote => {
                let image_data = encode_data_url(&frame.image, self.config.jpeg_quality)
                    .inspect_err(|_| self.drop_frame(DropReason::Encode))?;
                Ok(Dispatch::Remote(SignalMessage::Frame {
                    frame_id: frame.frame_id,
                    capture_ts: frame.capture_ts,
                    image_data,
                }))
            }
        }
    }

    /// Count a frame dropped before or after capture
    pub fn drop_frame(&mut self, reason: DropReason) {
        self.stats.dropped += 1;
        prom::record_frame_dropped(reason);
    }

    /// Apply a result to its frame record, then update metrics and overlay.
    ///
    /// Unknown ids are a no-op: the frame was evicted, or the store was
    /// cleared by a stop.
    #[instrument(
        name = "pipeline_on_result",
        skip(self, result, mode),
        fields(frame_id = %result.frame_id, mode = %mode)
    )]
    pub fn on_result(&mut self, result: DetectionResult, mode: InferenceMode) -> ResultOutcome {
        let now = self.clock.now_ms();

        let Some(record) = self.store.get_mut(&result.frame_id) else {
            debug!("Result for unknown frame ignored");
            self.stats.correlation_misses += 1;
            prom::record_correlation_miss();
            return ResultOutcome::Unknown;
        };

        if record.is_displayed() {
            debug!("Duplicate result ignored");
            self.stats.duplicates += 1;
            return ResultOutcome::Duplicate;
        }

        let (recv_ts, inference_ts, display_ts) =
            ordered_stamps(record.capture_ts, result.recv_ts, result.inference_ts, now);
        if (recv_ts, inference_ts) != (result.recv_ts, result.inference_ts) {
            debug!(
                recv_ts = result.recv_ts,
                inference_ts = result.inference_ts,
                display_ts,
                "Result stamps outside capture..display, clamped"
            );
        }
        record.recv_ts = Some(recv_ts);
        record.inference_ts = Some(inference_ts);
        record.display_ts = Some(display_ts);
        record.detections = result.detections;

        let latency_ms = record.e2e_latency_ms().unwrap_or_default();
        let detection_count = record.detections.len();

        self.metrics.record(record);
        let (width, height) = self.surface.size();
        let commands = self.renderer.render(&record.detections, width, height);
        self.surface.apply(&commands);

        self.stats.applied += 1;
        prom::record_result(mode, detection_count, latency_ms);
        debug!(latency_ms, detections = detection_count, "Result applied");

        ResultOutcome::Applied { latency_ms }
    }

    /// Completion of a local decode started by [`Dispatch::Local`]
    pub fn on_local_result(
        &mut self,
        frame_id: FrameId,
        capture_ts: u64,
        detections: Vec<Detection>,
    ) -> ResultOutcome {
        let inference_ts = self.clock.now_ms();
        self.on_result(
            DetectionResult {
                frame_id,
                capture_ts,
                recv_ts: capture_ts,
                inference_ts,
                detections,
            },
            InferenceMode::Local,
        )
    }

    /// Drop all frame records and wipe the overlay; late results become misses
    pub fn clear(&mut self) {
        self.clear_records();
        let (width, height) = self.surface.size();
        self.surface.apply(&self.renderer.render(&[], width, height));
    }

    /// Drop all frame records but keep the last overlay on the surface
    pub fn clear_records(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        debug!(dropped, "Frame records cleared");
    }

    /// Tear down the pipeline, handing back the render surface
    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn metrics(&self) -> &MetricsEngine {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricsEngine {
        &mut self.metrics
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Clamp result stamps so `capture <= recv <= inference <= display`.
///
/// Display is local time and never precedes capture; stamps from a relay
/// whose clock is skewed are pulled into that range.
fn ordered_stamps(capture_ts: u64, recv_ts: u64, inference_ts: u64, now: u64) -> (u64, u64, u64) {
    let display = now.max(capture_ts);
    let recv = recv_ts.clamp(capture_ts, display);
    let inference = inference_ts.clamp(recv, display);
    (recv, inference, display)
}
