//! Session controller event loop.
//!
//! A single task owns the pipeline, the detector, the relay link and the
//! signaling session. Handles talk to it through [`Command`]s; timers,
//! channel events and detector completions are multiplexed with `select!`.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    BenchmarkSummary, ChannelEvent, Detection, FrameId, IceCandidate, InferenceMode, MediaSource,
    MetricsSnapshot, RenderSurface, SessionConfig, SharedClock, SignalMessage, TelemetrySink,
};
use detector::{Decoder, Detector};
use image::RgbaImage;
use observability::{metrics as prom, DropReason};
use pipeline::{Dispatch, FramePipeline};
use signaling::{
    ChannelConnector, ChannelLink, PeerFactory, ReconnectPolicy, Routed, SignalingError,
    SignalingSession,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::SessionError;
use crate::report::{SessionReport, SessionStatus};

pub(crate) enum Command {
    Snapshot(oneshot::Sender<MetricsSnapshot>),
    Status(oneshot::Sender<SessionStatus>),
    Benchmark {
        duration: Duration,
        reply: oneshot::Sender<Result<BenchmarkSummary, SessionError>>,
    },
    SetMode(InferenceMode),
    RequestServerMetrics(oneshot::Sender<Result<(), SessionError>>),
}

struct LocalOutcome {
    frame_id: FrameId,
    capture_ts: u64,
    detections: Vec<Detection>,
}

struct Benchmark {
    deadline: Instant,
    duration: Duration,
    reply: oneshot::Sender<Result<BenchmarkSummary, SessionError>>,
}

/// Everything the builder hands over
pub(crate) struct Parts<S: RenderSurface, K> {
    pub config: SessionConfig,
    pub clock: SharedClock,
    pub source: Box<dyn MediaSource>,
    pub pipeline: FramePipeline<S>,
    pub decoder: Option<Decoder>,
    pub telemetry: Box<dyn TelemetrySink>,
    pub connector: Arc<K>,
    pub peers: Box<dyn PeerFactory>,
    pub candidates: mpsc::UnboundedReceiver<IceCandidate>,
    pub commands: mpsc::Receiver<Command>,
    pub stop: oneshot::Receiver<()>,
}

pub(crate) struct Controller<S: RenderSurface, K> {
    config: SessionConfig,
    clock: SharedClock,
    mode: InferenceMode,
    started: Instant,

    source: Box<dyn MediaSource>,
    pipeline: FramePipeline<S>,
    telemetry: Box<dyn TelemetrySink>,

    decoder: Option<Decoder>,
    detector: Option<Detector>,
    local_in_flight: bool,
    local_tx: mpsc::UnboundedSender<LocalOutcome>,
    local_rx: mpsc::UnboundedReceiver<LocalOutcome>,

    connector: Arc<K>,
    connect_task: Option<JoinHandle<()>>,
    connect_tx: mpsc::UnboundedSender<Result<ChannelLink, SignalingError>>,
    connect_rx: mpsc::UnboundedReceiver<Result<ChannelLink, SignalingError>>,
    link: Option<ChannelLink>,
    reconnect: ReconnectPolicy,
    reconnect_at: Option<Instant>,

    peers: Box<dyn PeerFactory>,
    candidates: mpsc::UnboundedReceiver<IceCandidate>,
    signaling: Option<SignalingSession>,

    commands: mpsc::Receiver<Command>,
    stop: oneshot::Receiver<()>,
    benchmark: Option<Benchmark>,

    reconnects: u64,
    connections: u64,
    server_reports: u64,
}

impl<S, K> Controller<S, K>
where
    S: RenderSurface + 'static,
    K: ChannelConnector + Sync + 'static,
{
    pub(crate) fn new(parts: Parts<S, K>) -> Self {
        let (local_tx, local_rx) = mpsc::unbounded_channel();
        let (connect_tx, connect_rx) = mpsc::unbounded_channel();
        let reconnect =
            ReconnectPolicy::fixed(Duration::from_millis(parts.config.server.reconnect_interval_ms));

        Self {
            mode: parts.config.inference.mode,
            started: Instant::now(),
            config: parts.config,
            clock: parts.clock,
            source: parts.source,
            pipeline: parts.pipeline,
            telemetry: parts.telemetry,
            decoder: parts.decoder,
            detector: None,
            local_in_flight: false,
            local_tx,
            local_rx,
            connector: parts.connector,
            connect_task: None,
            connect_tx,
            connect_rx,
            link: None,
            reconnect,
            reconnect_at: None,
            peers: parts.peers,
            candidates: parts.candidates,
            signaling: None,
            commands: parts.commands,
            stop: parts.stop,
            benchmark: None,
            reconnects: 0,
            connections: 0,
            server_reports: 0,
        }
    }

    /// Run until stopped, then release everything and report.
    #[instrument(name = "session_controller", skip(self), fields(endpoint = %self.connector.endpoint()))]
    pub(crate) async fn run(mut self) -> (SessionReport, S) {
        let mut capture = interval(capture_period(self.config.capture.target_fps));
        capture.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut display =
            interval(Duration::from_millis(self.config.metrics.display_interval_ms.max(1)));
        display.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if self.mode == InferenceMode::Local {
            self.ensure_detector();
        }
        self.connect();
        info!(mode = %self.mode, source = self.source.name(), "Session running");

        loop {
            tokio::select! {
                biased;

                _ = &mut self.stop => {
                    debug!("Stop requested");
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => {
                        debug!("All session handles dropped");
                        break;
                    }
                },

                Some(outcome) = self.connect_rx.recv() => self.on_connect_outcome(outcome),

                event = next_event(&mut self.link) => self.on_channel_event(event).await,

                Some(candidate) = self.candidates.recv() => self.on_local_candidate(candidate),

                Some(outcome) = self.local_rx.recv() => {
                    self.local_in_flight = false;
                    self.pipeline.on_local_result(
                        outcome.frame_id,
                        outcome.capture_ts,
                        outcome.detections,
                    );
                }

                _ = sleep_opt(self.reconnect_at) => {
                    self.reconnect_at = None;
                    self.reconnects += 1;
                    prom::record_reconnect();
                    self.connect();
                }

                _ = sleep_opt(self.benchmark.as_ref().map(|b| b.deadline)) => self.finish_benchmark(),

                _ = capture.tick() => self.on_capture_tick(),

                _ = display.tick() => {
                    let snapshot = self.pipeline.metrics().snapshot();
                    self.telemetry.local_metrics(&snapshot, self.mode);
                }
            }
        }

        self.shutdown().await
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Snapshot(reply) => {
                let _ = reply.send(self.pipeline.metrics().snapshot());
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Benchmark { duration, reply } => self.start_benchmark(duration, reply),
            Command::SetMode(mode) => self.set_mode(mode),
            Command::RequestServerMetrics(reply) => {
                let _ = reply.send(self.request_server_metrics());
            }
        }
    }

    // ---- capture & dispatch ----

    fn on_capture_tick(&mut self) {
        match self.mode {
            InferenceMode::Remote if self.link.is_none() => {
                trace!("No relay channel, dropping tick");
                self.pipeline.drop_frame(DropReason::ChannelDown);
                return;
            }
            InferenceMode::Local if self.local_in_flight => {
                trace!("Local decode in flight, dropping tick");
                self.pipeline.drop_frame(DropReason::DetectorBusy);
                return;
            }
            _ => {}
        }

        let Some(frame) = self.pipeline.capture(self.source.as_mut()) else {
            return;
        };

        match self.pipeline.dispatch(frame, self.mode) {
            Ok(Dispatch::Local {
                frame_id,
                capture_ts,
                image,
            }) => self.detect_local(frame_id, capture_ts, image),
            Ok(Dispatch::Remote(message)) => self.send_frame(message),
            Err(e) => warn!(error = %e, "Frame dispatch failed"),
        }
    }

    fn detect_local(&mut self, frame_id: FrameId, capture_ts: u64, image: RgbaImage) {
        self.ensure_detector();
        let Some(detector) = self.detector.clone() else {
            return;
        };
        let tx = self.local_tx.clone();
        self.local_in_flight = true;

        tokio::spawn(async move {
            let detections = detector.detect(image).await;
            // receiver is gone once the session stopped
            let _ = tx.send(LocalOutcome {
                frame_id,
                capture_ts,
                detections,
            });
        });
    }

    fn send_frame(&mut self, message: SignalMessage) {
        let Some(link) = &self.link else {
            self.pipeline.drop_frame(DropReason::ChannelDown);
            return;
        };
        match link.try_send(message) {
            Ok(()) => {}
            Err(SignalingError::QueueFull { .. }) => {
                self.pipeline.drop_frame(DropReason::QueueFull)
            }
            Err(e) => {
                debug!(error = %e, "Frame not sent");
                self.pipeline.drop_frame(DropReason::ChannelDown);
            }
        }
    }

    fn ensure_detector(&mut self) {
        if self.detector.is_some() {
            return;
        }
        let decoder = self.decoder.take().unwrap_or_else(|| {
            Decoder::from_config(&self.config.inference.model, self.clock.clone())
        });
        let detector = Detector::new(decoder);
        info!(kind = detector.kind(), "Local detector initialized");
        self.detector = Some(detector);
    }

    fn set_mode(&mut self, mode: InferenceMode) {
        if mode == InferenceMode::Local {
            self.ensure_detector();
        }
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "Inference mode changed");
            self.mode = mode;
        }
    }

    // ---- relay channel ----

    fn connect(&mut self) {
        if self.connect_task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        let connector = Arc::clone(&self.connector);
        let tx = self.connect_tx.clone();
        debug!("Connecting to relay");
        self.connect_task = Some(tokio::spawn(async move {
            let outcome = connector.connect().await;
            let _ = tx.send(outcome);
        }));
    }

    fn on_connect_outcome(&mut self, outcome: Result<ChannelLink, SignalingError>) {
        self.connect_task = None;
        match outcome {
            Ok(link) => {
                info!(channel = link.name(), "Relay channel open");
                self.reconnect.reset();
                self.connections += 1;
                self.link = Some(link);
                self.begin_signaling();
            }
            Err(e) => {
                warn!(error = %e, "Relay connection failed");
                self.schedule_reconnect();
            }
        }
    }

    /// Fresh peer and state machine for the new channel
    fn begin_signaling(&mut self) {
        let mut session = SignalingSession::new(self.peers.create());

        if self.source.is_active() {
            match session.begin_offer() {
                Ok(offer) => match self.link.as_ref().map(|link| link.try_send(offer)) {
                    Some(Ok(())) => session.offer_sent(),
                    Some(Err(e)) => session.offer_failed(&e),
                    None => {}
                },
                Err(e) => warn!(error = %e, "Offer creation failed, attempt abandoned"),
            }
        }

        prom::record_signaling_state(session.state().ordinal());
        self.signaling = Some(session);
    }

    async fn on_channel_event(&mut self, event: Option<ChannelEvent>) {
        match event {
            Some(ChannelEvent::Message(message)) => self.on_message(message),
            Some(ChannelEvent::Closed) | None => {
                info!("Relay channel closed");
                self.on_channel_lost().await;
            }
            Some(ChannelEvent::Error(e)) => {
                warn!(error = %e, "Relay channel failed");
                self.on_channel_lost().await;
            }
        }
    }

    fn on_message(&mut self, message: SignalMessage) {
        let kind = message.kind();
        let Some(session) = self.signaling.as_mut() else {
            debug!(kind, "No signaling session, message ignored");
            return;
        };

        let before = session.state();
        let routed = session.route(message);
        if session.state() != before {
            prom::record_signaling_state(session.state().ordinal());
        }

        match routed {
            Routed::Detections(result) => {
                self.pipeline.on_result(result, InferenceMode::Remote);
            }
            Routed::Metrics(data) => {
                self.server_reports += 1;
                self.telemetry.server_metrics(&data);
            }
            Routed::Config(mode) => self.set_mode(mode),
            Routed::Handled => {}
            Routed::Ignored => trace!(kind, "Message ignored"),
        }
    }

    fn on_local_candidate(&mut self, candidate: IceCandidate) {
        let (Some(session), Some(link)) = (self.signaling.as_mut(), self.link.as_ref()) else {
            trace!("No signaling session, local candidate dropped");
            return;
        };
        if let Some(message) = session.local_candidate(candidate) {
            if let Err(e) = link.try_send(message) {
                debug!(error = %e, "Local candidate not sent");
            }
        }
    }

    async fn on_channel_lost(&mut self) {
        self.close_signaling();
        if let Some(link) = self.link.take() {
            let stats = link.stats();
            link.shutdown().await;
            debug!(sent = stats.sent, received = stats.received, "Relay link released");
        }
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        match self.reconnect.next_delay() {
            Some(delay) => {
                info!(
                    delay_ms = delay.as_millis() as u64,
                    attempt = self.reconnect.attempts(),
                    "Reconnect scheduled"
                );
                self.reconnect_at = Some(Instant::now() + delay);
            }
            None => warn!(
                attempts = self.reconnect.attempts(),
                "Reconnect attempts exhausted, staying offline"
            ),
        }
    }

    fn close_signaling(&mut self) {
        if let Some(mut session) = self.signaling.take() {
            session.close();
            prom::record_signaling_state(session.state().ordinal());
        }
    }

    fn request_server_metrics(&self) -> Result<(), SessionError> {
        let link = self.link.as_ref().ok_or(SessionError::NotConnected)?;
        link.try_send(SignalMessage::MetricsRequest)?;
        Ok(())
    }

    // ---- benchmark ----

    fn start_benchmark(
        &mut self,
        duration: Duration,
        reply: oneshot::Sender<Result<BenchmarkSummary, SessionError>>,
    ) {
        if self.benchmark.is_some() {
            let _ = reply.send(Err(SessionError::BenchmarkRunning));
            return;
        }
        self.pipeline.metrics_mut().reset();
        info!(duration_secs = duration.as_secs(), mode = %self.mode, "Benchmark started");
        self.benchmark = Some(Benchmark {
            deadline: Instant::now() + duration,
            duration,
            reply,
        });
    }

    fn finish_benchmark(&mut self) {
        let Some(benchmark) = self.benchmark.take() else {
            return;
        };
        let summary = self
            .pipeline
            .metrics()
            .benchmark_summary(benchmark.duration.as_secs(), self.mode);
        info!(
            frames = summary.frames_processed,
            fps = format_args!("{:.2}", summary.processed_fps),
            median_ms = summary.median_e2e_latency_ms,
            p95_ms = summary.p95_e2e_latency_ms,
            "Benchmark finished"
        );
        let _ = benchmark.reply.send(Ok(summary));
    }

    // ---- teardown ----

    fn status(&self) -> SessionStatus {
        let stats = self.pipeline.stats();
        SessionStatus {
            mode: self.mode,
            signaling: self
                .link
                .as_ref()
                .and(self.signaling.as_ref())
                .map(SignalingSession::state),
            detector_ready: self.detector.is_some(),
            frames_captured: stats.captured,
            frames_dropped: stats.dropped,
            results_applied: stats.applied,
            reconnects: self.reconnects,
        }
    }

    fn report(&self) -> SessionReport {
        let stats = self.pipeline.stats();
        SessionReport {
            mode: self.mode,
            runtime: self.started.elapsed(),
            frames_captured: stats.captured,
            frames_dropped: stats.dropped,
            results_applied: stats.applied,
            correlation_misses: stats.correlation_misses,
            duplicates: stats.duplicates,
            reconnects: self.reconnects,
            connections: self.connections,
            server_reports: self.server_reports,
            snapshot: self.pipeline.metrics().snapshot(),
        }
    }

    /// Capture is already halted (the loop has exited). Release the source,
    /// tear down signaling and forget every frame so late results miss.
    async fn shutdown(mut self) -> (SessionReport, S) {
        self.source.stop();
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        self.reconnect_at = None;
        self.close_signaling();
        if let Some(link) = self.link.take() {
            link.shutdown().await;
        }
        if let Some(benchmark) = self.benchmark.take() {
            let _ = benchmark.reply.send(Err(SessionError::Stopped));
        }
        self.pipeline.clear_records();

        let report = self.report();
        info!(
            frames_captured = report.frames_captured,
            results = report.results_applied,
            reconnects = report.reconnects,
            "Session stopped"
        );
        (report, self.pipeline.into_surface())
    }
}

async fn next_event(link: &mut Option<ChannelLink>) -> Option<ChannelEvent> {
    match link {
        Some(link) => link.recv().await,
        None => pending().await,
    }
}

async fn sleep_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

/// Dispatch period for a rate cap; the config loader rejects rates <= 0
const MIN_CAPTURE_PERIOD: Duration = Duration::from_millis(1);
const MAX_CAPTURE_PERIOD: Duration = Duration::from_secs(60);

/// Tick period for a capture rate, clamped to `[1 ms, 60 s]`
fn capture_period(target_fps: f64) -> Duration {
    if !(target_fps.is_finite() && target_fps > 0.0) {
        return Duration::from_secs_f64(1.0 / 15.0);
    }
    Duration::try_from_secs_f64(1.0 / target_fps)
        .unwrap_or(MAX_CAPTURE_PERIOD)
        .clamp(MIN_CAPTURE_PERIOD, MAX_CAPTURE_PERIOD)
}
