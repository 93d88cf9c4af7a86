//! ChannelLink - runs a message channel in its own worker task
//!
//! Outbound messages go through a bounded queue (full queue = message
//! dropped, never blocks the event loop). Inbound events come back on a
//! second queue. The worker ends on a terminal event or on shutdown.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::{ChannelEvent, MessageChannel, SignalMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::error::SignalingError;

/// Counters shared between the handle and its worker
#[derive(Debug, Default)]
pub struct LinkMetrics {
    queue_len: AtomicUsize,
    sent: AtomicU64,
    received: AtomicU64,
    send_failures: AtomicU64,
    dropped: AtomicU64,
}

impl LinkMetrics {
    pub fn snapshot(&self) -> LinkStats {
        LinkStats {
            queue_len: self.queue_len.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub queue_len: usize,
    pub sent: u64,
    pub received: u64,
    pub send_failures: u64,
    pub dropped: u64,
}

pub struct ChannelLink {
    name: String,
    tx: mpsc::Sender<SignalMessage>,
    events: mpsc::Receiver<ChannelEvent>,
    metrics: Arc<LinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl ChannelLink {
    pub fn spawn<C: MessageChannel + 'static>(channel: C, queue_capacity: usize) -> Self {
        let name = channel.name().to_string();
        let capacity = queue_capacity.max(1);
        let (tx, out_rx) = mpsc::channel(capacity);
        let (events_tx, events) = mpsc::channel(capacity);
        let metrics = Arc::new(LinkMetrics::default());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();
        let worker_handle = tokio::spawn(async move {
            link_worker(channel, out_rx, events_tx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            events,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a message without waiting.
    ///
    /// # Errors
    /// `QueueFull` drops the message; `ChannelClosed` means the worker ended.
    pub fn try_send(&self, message: SignalMessage) -> Result<(), SignalingError> {
        match self.tx.try_send(message) {
            Ok(()) => {
                self.metrics
                    .queue_len
                    .store(self.tx.max_capacity() - self.tx.capacity(), Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(m)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(channel = %self.name, kind = m.kind(), "Outbound queue full, message dropped");
                Err(SignalingError::QueueFull {
                    channel: self.name.clone(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SignalingError::ChannelClosed {
                channel: self.name.clone(),
            }),
        }
    }

    /// Next inbound event; `None` once the worker has stopped. Cancel-safe.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    pub fn stats(&self) -> LinkStats {
        self.metrics.snapshot()
    }

    #[instrument(name = "channel_link_shutdown", skip(self), fields(channel = %self.name))]
    pub async fn shutdown(self) {
        drop(self.events);
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(channel = %self.name, error = ?e, "Link worker panicked");
        }
        debug!(channel = %self.name, "ChannelLink shutdown complete");
    }
}

#[instrument(
    name = "channel_link_worker",
    skip(channel, out_rx, events_tx, metrics),
    fields(channel = %name)
)]
async fn link_worker<C: MessageChannel>(
    mut channel: C,
    mut out_rx: mpsc::Receiver<SignalMessage>,
    events_tx: mpsc::Sender<ChannelEvent>,
    metrics: Arc<LinkMetrics>,
    name: String,
) {
    debug!("Link worker started");

    loop {
        tokio::select! {
            outbound = out_rx.recv() => {
                let Some(message) = outbound else {
                    break;
                };
                metrics.queue_len.store(out_rx.len(), Ordering::Relaxed);
                match channel.send(&message).await {
                    Ok(()) => {
                        metrics.sent.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                        warn!(kind = message.kind(), error = %e, "Send failed, closing link");
                        let _ = events_tx.send(ChannelEvent::Error(e)).await;
                        break;
                    }
                }
            }
            event = channel.recv() => {
                let terminal = event.is_terminal();
                if !terminal {
                    metrics.received.fetch_add(1, Ordering::Relaxed);
                }
                if events_tx.send(event).await.is_err() || terminal {
                    break;
                }
            }
        }
    }

    if let Err(e) = channel.close().await {
        debug!(error = %e, "Close after link end failed");
    }
    debug!("Link worker stopped");
}
