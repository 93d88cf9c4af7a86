//! SessionHandle - the caller's side of a running session

use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::{BenchmarkSummary, InferenceMode, MetricsSnapshot};
use observability::write_summary;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use crate::controller::Command;
use crate::error::SessionError;
use crate::report::{SessionReport, SessionStatus};

/// What is left after a session stops
#[derive(Debug)]
pub struct StoppedSession<S> {
    pub report: SessionReport,
    /// The render surface, still showing the last overlay
    pub surface: S,
}

/// Handle to a running session.
///
/// Dropping the handle without calling [`stop`](Self::stop) also ends the
/// session, but the report and surface are lost.
pub struct SessionHandle<S> {
    commands: mpsc::Sender<Command>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<(SessionReport, S)>,
    export_path: PathBuf,
}

impl<S> SessionHandle<S> {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        stop: oneshot::Sender<()>,
        task: JoinHandle<(SessionReport, S)>,
        export_path: PathBuf,
    ) -> Self {
        Self {
            commands,
            stop: Some(stop),
            task,
            export_path,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| SessionError::Stopped)?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub async fn snapshot(&self) -> Result<MetricsSnapshot, SessionError> {
        self.request(Command::Snapshot).await
    }

    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        self.request(Command::Status).await
    }

    /// Reset the metrics, let the pipeline run for `duration`, then write the
    /// summary to the configured export path and return it.
    pub async fn run_benchmark(&self, duration: Duration) -> Result<BenchmarkSummary, SessionError> {
        let summary = self
            .request(|reply| Command::Benchmark { duration, reply })
            .await??;
        write_summary(&summary, &self.export_path).map_err(SessionError::Export)?;
        info!(path = %self.export_path.display(), "Benchmark summary exported");
        Ok(summary)
    }

    pub async fn set_mode(&self, mode: InferenceMode) -> Result<(), SessionError> {
        self.commands
            .send(Command::SetMode(mode))
            .await
            .map_err(|_| SessionError::Stopped)
    }

    /// Ask the server for a `metrics` report; it reaches the telemetry sink
    pub async fn request_server_metrics(&self) -> Result<(), SessionError> {
        self.request(Command::RequestServerMetrics).await?
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Halt capture, release the source, close signaling and wait for the
    /// controller to finish.
    pub async fn stop(mut self) -> Result<StoppedSession<S>, SessionError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let (report, surface) = self
            .task
            .await
            .map_err(|e| SessionError::task(e.to_string()))?;
        Ok(StoppedSession { report, surface })
    }
}
