//! # Integration Tests
//!
//! Cross-crate scenarios that need no camera, model, or relay:
//! - contract snapshots (config round trip, wire names)
//! - pipeline correlation over a manual clock
//! - full sessions against an in-memory relay

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{InferenceMode, SessionConfig, SignalMessage};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = SessionConfig::default();
        config.server.port = 9100;
        config.inference.mode = InferenceMode::Remote;
        config.metrics.latency_window = 50;

        let toml = ConfigLoader::to_toml(&config).unwrap();
        assert_eq!(
            ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap(),
            config
        );
        let json = ConfigLoader::to_json(&config).unwrap();
        assert_eq!(
            ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap(),
            config
        );
    }

    #[test]
    fn test_legacy_mode_names_in_config_file() {
        let config =
            ConfigLoader::load_from_str("[inference]\nmode = \"server\"\n", ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config.inference.mode, InferenceMode::Remote);

        let msg: SignalMessage = serde_json::from_str(r#"{"type":"config","mode":"wasm"}"#).unwrap();
        assert_eq!(
            msg,
            SignalMessage::Config {
                mode: InferenceMode::Local
            }
        );
    }
}

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;

    use contracts::{
        BoundingBox, Detection, DetectionResult, FrameId, InferenceMode, ManualClock, MediaSource,
    };
    use media::{SyntheticCamera, SyntheticCameraConfig};
    use overlay::RecordingSurface;
    use pipeline::{FramePipeline, PipelineConfig, ResultOutcome};

    fn setup() -> (
        Arc<ManualClock>,
        SyntheticCamera,
        FramePipeline<RecordingSurface>,
    ) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let mut camera = SyntheticCamera::new(
            SyntheticCameraConfig {
                width: 64,
                height: 48,
                ..Default::default()
            },
            clock.clone(),
        );
        camera.start().unwrap();
        let pipeline = FramePipeline::new(
            PipelineConfig::default(),
            clock.clone(),
            RecordingSurface::new(320, 240),
        );
        (clock, camera, pipeline)
    }

    fn person(score: f32) -> Detection {
        Detection::new(
            "person",
            score,
            BoundingBox::Corners {
                xmin: 0.2,
                ymin: 0.1,
                xmax: 0.6,
                ymax: 0.9,
            },
        )
    }

    /// Three local frames, one detection each, 50 ms from capture to display
    #[test]
    fn test_e2e_local_three_frames() {
        let (clock, mut camera, mut pipeline) = setup();

        for _ in 0..3 {
            let frame = pipeline.capture(&mut camera).unwrap();
            clock.advance(50);
            let outcome =
                pipeline.on_local_result(frame.frame_id, frame.capture_ts, vec![person(0.8)]);
            assert_eq!(outcome, ResultOutcome::Applied { latency_ms: 50 });
            clock.advance(50);
        }

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.frames, 3);
        assert_eq!(snapshot.detections, 3);
        assert_eq!(snapshot.latency_median, 50.0);
        assert_eq!(snapshot.latency_mean, 50.0);
        assert_eq!(snapshot.avg_detections_per_frame, 1.0);
        assert_eq!(pipeline.surface().box_count(), 1);
    }

    /// Results are matched by id, not by arrival order
    #[test]
    fn test_out_of_order_remote_results() {
        let (clock, mut camera, mut pipeline) = setup();
        let mut frames = Vec::new();
        for _ in 0..7 {
            frames.push(pipeline.capture(&mut camera).unwrap());
            clock.advance(10);
        }
        let (f5, f6) = (&frames[5], &frames[6]);
        assert_eq!(f5.frame_id, "frame_5");
        assert_eq!(f6.frame_id, "frame_6");

        let result = |frame: &pipeline::CapturedFrame, n: usize| DetectionResult {
            frame_id: frame.frame_id.clone(),
            capture_ts: frame.capture_ts,
            recv_ts: frame.capture_ts + 3,
            inference_ts: frame.capture_ts + 8,
            detections: vec![person(0.9); n],
        };

        clock.advance(30);
        assert!(matches!(
            pipeline.on_result(result(f6, 2), InferenceMode::Remote),
            ResultOutcome::Applied { .. }
        ));
        clock.advance(30);
        assert!(matches!(
            pipeline.on_result(result(f5, 1), InferenceMode::Remote),
            ResultOutcome::Applied { .. }
        ));

        let r5 = pipeline.store().get("frame_5").unwrap();
        let r6 = pipeline.store().get("frame_6").unwrap();
        assert_eq!(r5.detections.len(), 1);
        assert_eq!(r6.detections.len(), 2);
        assert_eq!(r5.inference_ts, Some(f5.capture_ts + 8));
        assert!(r5.display_ts > r6.display_ts);
        // the last applied result owns the overlay
        assert_eq!(pipeline.surface().box_count(), 1);
    }

    #[test]
    fn test_evicted_frame_result_is_a_miss() {
        let (clock, mut camera, mut pipeline) = setup();
        for _ in 0..101 {
            pipeline.capture(&mut camera).unwrap();
            clock.advance(1);
        }
        assert_eq!(pipeline.store().len(), 100);
        assert!(!pipeline.store().contains("frame_0"));
        assert!(pipeline.store().contains("frame_100"));

        let late = DetectionResult {
            frame_id: FrameId::new("frame_0"),
            capture_ts: 0,
            recv_ts: 0,
            inference_ts: 0,
            detections: vec![person(0.9)],
        };
        assert_eq!(
            pipeline.on_result(late, InferenceMode::Remote),
            ResultOutcome::Unknown
        );
        assert_eq!(pipeline.stats().correlation_misses, 1);
        assert_eq!(pipeline.metrics().frames(), 0);
        assert_eq!(pipeline.surface().batches(), 0);
    }
}

#[cfg(test)]
mod detector_tests {
    use detector::{
        Detector, ModelDecoder, TensorLayout, TensorReplayBackend, Thresholds, COCO_CLASSES,
    };
    use image::RgbaImage;

    #[tokio::test]
    async fn test_model_decode_through_detector() {
        let layout = TensorLayout {
            rows: 2,
            num_classes: 2,
            input_size: 32,
        };
        #[rustfmt::skip]
        let output = vec![
            // objectness passes, combined 0.6 x 0.4 = 0.24 does not
            16.0, 16.0, 8.0, 8.0, 0.6, 0.4, 0.1,
            // 0.9 x 0.9 = 0.81, class 1
            8.0, 8.0, 16.0, 16.0, 0.9, 0.0, 0.9,
        ];
        let decoder = ModelDecoder::new(
            Box::new(TensorReplayBackend::from_values(output)),
            layout,
            Thresholds::default(),
        );
        let detector = Detector::new(detector::Decoder::Model(decoder));

        let detections = detector.detect(RgbaImage::new(64, 48)).await;
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        assert_eq!(d.label, COCO_CLASSES[1]);
        assert!((d.score - 0.81).abs() < 1e-5);
        let c = d.bbox.corners();
        assert_eq!((c.xmin, c.ymin, c.xmax, c.ymax), (0.0, 0.0, 0.5, 0.5));
        assert!(!detector.is_busy());
    }
}

#[cfg(test)]
mod session_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        BoundingBox, ChannelEvent, Detection, DetectionResult, InferenceMode, MessageChannel,
        SessionConfig, SignalMessage,
    };
    use media::SyntheticCamera;
    use overlay::RecordingSurface;
    use session::{SessionBuilder, SessionHandle, SessionStatus};
    use signaling::{MemoryChannel, MemoryConnector};
    use tokio::sync::mpsc;

    fn fast_config(mode: InferenceMode) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.capture.target_fps = 50.0;
        config.server.reconnect_interval_ms = 40;
        config.metrics.display_interval_ms = 25;
        config.inference.mode = mode;
        config
    }

    /// Relay behavior for one accepted channel
    #[derive(Clone, Copy)]
    struct Script {
        /// Hang up after answering this many frames
        close_after: Option<usize>,
    }

    /// Echo relay: answers offers, turns every frame into one detection,
    /// answers metrics requests with a report and a `wasm` mode switch.
    async fn serve(mut channel: MemoryChannel, script: Script, frames_seen: Arc<AtomicUsize>) {
        let mut frames = 0usize;
        loop {
            let message = match channel.recv().await {
                ChannelEvent::Message(message) => message,
                ChannelEvent::Closed | ChannelEvent::Error(_) => return,
            };
            let replies = match message {
                SignalMessage::Offer { .. } => vec![SignalMessage::Answer {
                    sdp: "v=0\r\no=relay 1 1 IN IP4 127.0.0.1\r\n".to_string(),
                }],
                SignalMessage::Frame {
                    frame_id,
                    capture_ts,
                    image_data,
                } => {
                    assert!(media::decode_data_url(&image_data).is_some());
                    frames += 1;
                    frames_seen.fetch_add(1, Ordering::SeqCst);
                    vec![SignalMessage::Detections(DetectionResult {
                        frame_id,
                        capture_ts,
                        recv_ts: capture_ts + 2,
                        inference_ts: capture_ts + 5,
                        detections: vec![Detection::new(
                            "person",
                            0.9,
                            BoundingBox::Corners {
                                xmin: 0.1,
                                ymin: 0.1,
                                xmax: 0.4,
                                ymax: 0.7,
                            },
                        )],
                    })]
                }
                SignalMessage::MetricsRequest => vec![
                    SignalMessage::Metrics {
                        data: serde_json::json!({ "frames_processed": frames }),
                    },
                    serde_json::from_str(r#"{"type":"config","mode":"wasm"}"#).unwrap(),
                ],
                _ => Vec::new(),
            };
            for reply in &replies {
                if channel.send(reply).await.is_err() {
                    return;
                }
            }
            if script.close_after.is_some_and(|n| frames >= n) {
                let _ = channel.close().await;
                return;
            }
        }
    }

    fn spawn_relay(
        mut incoming: mpsc::UnboundedReceiver<MemoryChannel>,
        scripts: Vec<Script>,
    ) -> Arc<AtomicUsize> {
        let frames_seen = Arc::new(AtomicUsize::new(0));
        let seen = frames_seen.clone();
        tokio::spawn(async move {
            let mut scripts = scripts.into_iter();
            while let Some(channel) = incoming.recv().await {
                let script = scripts.next().unwrap_or(Script { close_after: None });
                tokio::spawn(serve(channel, script, seen.clone()));
            }
        });
        frames_seen
    }

    async fn wait_for<S>(
        handle: &SessionHandle<S>,
        what: &str,
        predicate: impl Fn(&SessionStatus) -> bool,
    ) -> SessionStatus {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let status = handle.status().await.unwrap();
            if predicate(&status) {
                return status;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {what}: {status:?}"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn test_remote_session_against_relay() {
        let (connector, incoming) = MemoryConnector::new("relay", 64);
        let frames_seen = spawn_relay(incoming, vec![Script { close_after: None }]);

        let handle = SessionBuilder::new(fast_config(InferenceMode::Remote))
            .start(
                SyntheticCamera::with_size(160, 120),
                RecordingSurface::new(320, 240),
                Arc::new(connector),
            )
            .unwrap();

        let status = wait_for(&handle, "remote results", |s| {
            s.is_connected() && s.results_applied >= 3
        })
        .await;
        assert_eq!(status.mode, InferenceMode::Remote);
        assert!(!status.detector_ready);
        assert!(frames_seen.load(Ordering::SeqCst) >= 3);
        assert!(handle.snapshot().await.unwrap().detections >= 3);

        handle.request_server_metrics().await.unwrap();
        let status = wait_for(&handle, "mode switch", |s| s.mode == InferenceMode::Local).await;
        assert!(status.detector_ready);

        let stopped = handle.stop().await.unwrap();
        let report = stopped.report;
        assert_eq!(report.connections, 1);
        assert_eq!(report.server_reports, 1);
        assert_eq!(report.correlation_misses, 0);
        assert!(report.results_applied >= 3);
        assert!(stopped.surface.box_count() >= 1);
    }

    #[tokio::test]
    async fn test_reconnects_after_relay_hangs_up() {
        let (connector, incoming) = MemoryConnector::new("flaky", 64);
        connector.refuse(1);
        let connector = Arc::new(connector);
        spawn_relay(
            incoming,
            vec![Script {
                close_after: Some(2),
            }],
        );

        let handle = SessionBuilder::new(fast_config(InferenceMode::Remote))
            .start(
                SyntheticCamera::with_size(160, 120),
                RecordingSurface::new(320, 240),
                Arc::clone(&connector),
            )
            .unwrap();

        // refused once, served two frames, hung up, then reconnected for good
        let status = wait_for(&handle, "second connection", |s| {
            s.reconnects >= 2 && s.is_connected() && s.results_applied >= 4
        })
        .await;
        assert!(status.frames_dropped > 0);
        assert!(connector.attempts() >= 3);

        let report = handle.stop().await.unwrap().report;
        assert_eq!(report.connections, 2);
    }

    #[tokio::test]
    async fn test_stop_forgets_inflight_frames() {
        let (connector, incoming) = MemoryConnector::new("silent", 64);
        // accept channels but never answer anything
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut incoming = incoming;
            let mut held = Vec::new();
            while let Some(channel) = incoming.recv().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(channel);
            }
        });

        let handle = SessionBuilder::new(fast_config(InferenceMode::Remote))
            .start(
                SyntheticCamera::with_size(160, 120),
                RecordingSurface::new(320, 240),
                Arc::new(connector),
            )
            .unwrap();

        let status = wait_for(&handle, "captured frames", |s| s.frames_captured >= 3).await;
        assert_eq!(status.results_applied, 0);
        assert!(!status.is_connected());

        let stopped = handle.stop().await.unwrap();
        assert_eq!(stopped.report.results_applied, 0);
        assert_eq!(stopped.report.snapshot.frames, 0);
        assert_eq!(stopped.surface.batches(), 0);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }
}
