//! SessionBuilder - wires collaborators into a running session

use std::sync::Arc;

use contracts::{
    IceCandidate, MediaSource, RenderSurface, SessionConfig, SharedClock, SystemClock,
    TelemetrySink,
};
use detector::Decoder;
use observability::LogTelemetrySink;
use pipeline::{FramePipeline, PipelineConfig};
use signaling::{ChannelConnector, PeerFactory, StaticPeerFactory};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, instrument};

use crate::controller::{Controller, Parts};
use crate::error::SessionError;
use crate::handle::SessionHandle;

const COMMAND_QUEUE: usize = 16;

/// Composition root.
///
/// Every collaborator is injected; unset ones get headless defaults
/// (system clock, decoder built from config on first local use, loopback
/// peer, log telemetry).
///
/// ```no_run
/// # async fn demo() -> Result<(), session::SessionError> {
/// use std::sync::Arc;
/// use contracts::SessionConfig;
/// use media::SyntheticCamera;
/// use overlay::ImageSurface;
/// use session::SessionBuilder;
/// use signaling::TcpConnector;
///
/// let config = SessionConfig::default();
/// let connector = Arc::new(TcpConnector::new(config.server.endpoint(), 64));
/// let handle = SessionBuilder::new(config).start(
///     SyntheticCamera::with_size(640, 480),
///     ImageSurface::new(320, 240),
///     connector,
/// )?;
/// let stopped = handle.stop().await?;
/// println!("{} frames", stopped.report.frames_captured);
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    config: SessionConfig,
    clock: SharedClock,
    decoder: Option<Decoder>,
    peers: Option<(Box<dyn PeerFactory>, mpsc::UnboundedReceiver<IceCandidate>)>,
    telemetry: Option<Box<dyn TelemetrySink>>,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            decoder: None,
            peers: None,
            telemetry: None,
        }
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Decoder to use when local mode is first entered
    pub fn decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Peer factory plus the stream its peers report local candidates on
    pub fn peer(
        mut self,
        factory: impl PeerFactory,
        candidates: mpsc::UnboundedReceiver<IceCandidate>,
    ) -> Self {
        self.peers = Some((Box::new(factory), candidates));
        self
    }

    pub fn telemetry(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.telemetry = Some(Box::new(sink));
        self
    }

    /// Acquire the media source and spawn the controller.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// `SessionError::Acquisition` if the source cannot be started; the
    /// session is not created and nothing is retried.
    #[instrument(
        name = "session_start",
        skip_all,
        fields(source = source.name(), mode = %self.config.inference.mode)
    )]
    pub fn start<M, S, K>(
        self,
        mut source: M,
        surface: S,
        connector: Arc<K>,
    ) -> Result<SessionHandle<S>, SessionError>
    where
        M: MediaSource + 'static,
        S: RenderSurface + 'static,
        K: ChannelConnector + Sync + 'static,
    {
        source.start().map_err(SessionError::Acquisition)?;
        info!(endpoint = %connector.endpoint(), "Media source acquired");

        let pipeline = FramePipeline::new(
            PipelineConfig::from_config(&self.config.capture, &self.config.metrics),
            self.clock.clone(),
            surface,
        );
        let (peers, candidates) = match self.peers {
            Some(peers) => peers,
            None => {
                let (factory, candidates) = StaticPeerFactory::new();
                (Box::new(factory) as Box<dyn PeerFactory>, candidates)
            }
        };
        let telemetry = self
            .telemetry
            .unwrap_or_else(|| Box::new(LogTelemetrySink::default()));

        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let (stop_tx, stop) = oneshot::channel();
        let export_path = self.config.metrics.export_path.clone();

        let controller = Controller::new(Parts {
            config: self.config,
            clock: self.clock,
            source: Box::new(source),
            pipeline,
            decoder: self.decoder,
            telemetry,
            connector,
            peers,
            candidates,
            commands,
            stop,
        });
        let task = tokio::spawn(controller.run());

        Ok(SessionHandle::new(command_tx, stop_tx, task, export_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{InferenceMode, ManualClock, MetricsSnapshot};
    use media::SyntheticCamera;
    use overlay::RecordingSurface;
    use signaling::MemoryConnector;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct CollectingSink {
        local: Arc<Mutex<Vec<MetricsSnapshot>>>,
        server: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    impl TelemetrySink for CollectingSink {
        fn local_metrics(&mut self, snapshot: &MetricsSnapshot, _mode: InferenceMode) {
            self.local.lock().unwrap().push(*snapshot);
        }

        fn server_metrics(&mut self, data: &serde_json::Value) {
            self.server.lock().unwrap().push(data.clone());
        }
    }

    fn fast_config() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.capture.target_fps = 50.0;
        config.server.reconnect_interval_ms = 40;
        config.metrics.display_interval_ms = 25;
        config.inference.mode = InferenceMode::Local;
        config
    }

    fn offline_connector() -> Arc<MemoryConnector> {
        // receiver dropped: every attempt fails with "no server listening"
        let (connector, _incoming) = MemoryConnector::new("offline", 8);
        Arc::new(connector)
    }

    #[tokio::test]
    async fn test_unavailable_source_is_reported() {
        let result = SessionBuilder::new(fast_config()).start(
            SyntheticCamera::unavailable("front"),
            RecordingSurface::new(320, 240),
            offline_connector(),
        );
        assert!(matches!(result, Err(SessionError::Acquisition(_))));
    }

    #[tokio::test]
    async fn test_local_mode_runs_without_relay() {
        let sink = CollectingSink::default();
        let connector = offline_connector();
        let handle = SessionBuilder::new(fast_config())
            .decoder(Decoder::mock(Arc::new(ManualClock::new(1_000))))
            .telemetry(sink.clone())
            .start(
                SyntheticCamera::with_size(160, 120),
                RecordingSurface::new(320, 240),
                Arc::clone(&connector),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        let status = handle.status().await.unwrap();
        assert!(status.detector_ready);
        assert_eq!(status.signaling, None);
        assert!(!status.is_connected());
        assert!(handle.snapshot().await.unwrap().frames > 0);
        assert!(matches!(
            handle.request_server_metrics().await,
            Err(SessionError::NotConnected)
        ));

        let stopped = handle.stop().await.unwrap();
        let report = stopped.report;
        assert!(report.frames_captured > 0);
        assert!(report.results_applied > 0);
        assert_eq!(report.connections, 0);
        assert!(report.reconnects >= 2);
        assert!(connector.attempts() >= 3);
        // mock at t=1s: sin(0.5) > 0 so a person box is always present
        assert!(stopped.surface.box_count() >= 1);
        assert!(!sink.local.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_mode_without_relay_drops_ticks() {
        let mut config = fast_config();
        config.inference.mode = InferenceMode::Remote;
        let handle = SessionBuilder::new(config)
            .start(
                SyntheticCamera::with_size(160, 120),
                RecordingSurface::new(320, 240),
                offline_connector(),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = handle.status().await.unwrap();
        assert!(!status.detector_ready);
        assert_eq!(status.frames_captured, 0);
        assert!(status.frames_dropped > 0);

        handle.set_mode(InferenceMode::Local).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.mode, InferenceMode::Local);
        assert!(status.detector_ready);
        assert!(status.frames_captured > 0);

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_benchmark_exports_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast_config();
        config.metrics.export_path = dir.path().join("metrics.json");

        let handle = SessionBuilder::new(config)
            .start(
                SyntheticCamera::with_size(160, 120),
                RecordingSurface::new(320, 240),
                offline_connector(),
            )
            .unwrap();

        let (summary, second) = tokio::join!(
            handle.run_benchmark(Duration::from_millis(300)),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                handle.run_benchmark(Duration::from_millis(10)).await
            }
        );
        let summary = summary.unwrap();
        assert!(matches!(second, Err(SessionError::BenchmarkRunning)));
        assert_eq!(summary.mode, InferenceMode::Local);
        assert_eq!(summary.duration_seconds, 0);
        assert!(summary.frames_processed > 0);
        assert!(summary.processed_fps > 0.0);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(handle.export_path()).unwrap())
                .unwrap();
        assert_eq!(written["frames_processed"], summary.frames_processed);
        assert_eq!(written["mode"], "local");

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_extreme_capture_rate_does_not_kill_controller() {
        let mut config = fast_config();
        config.capture.target_fps = 1e10;
        let handle = SessionBuilder::new(config)
            .start(
                SyntheticCamera::with_size(32, 24),
                RecordingSurface::new(320, 240),
                offline_connector(),
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        let stopped = handle.stop().await.unwrap();
        assert!(stopped.report.frames_captured > 0);
    }

    #[tokio::test]
    async fn test_stop_halts_and_handle_is_consumed() {
        let handle = SessionBuilder::new(fast_config())
            .start(
                SyntheticCamera::with_size(160, 120),
                RecordingSurface::new(320, 240),
                offline_connector(),
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());

        let stopped = handle.stop().await.unwrap();
        let captured = stopped.report.frames_captured;
        assert!(captured > 0);
        assert!(stopped.report.runtime >= Duration::from_millis(100));
    }
}
