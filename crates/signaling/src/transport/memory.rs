//! In-memory channel pairs, for tests and embedding.

use std::sync::atomic::{AtomicUsize, Ordering};

use contracts::{ChannelEvent, ContractError, MessageChannel, SignalMessage};
use tokio::sync::mpsc;

use crate::connector::ChannelConnector;
use crate::error::SignalingError;
use crate::link::ChannelLink;

pub struct MemoryChannel {
    name: String,
    tx: Option<mpsc::UnboundedSender<SignalMessage>>,
    rx: mpsc::UnboundedReceiver<SignalMessage>,
}

impl MemoryChannel {
    /// Two connected ends; closing one makes the other see `Closed`
    pub fn pair(name: &str) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self {
                name: format!("{name}/client"),
                tx: Some(a_tx),
                rx: a_rx,
            },
            Self {
                name: format!("{name}/server"),
                tx: Some(b_tx),
                rx: b_rx,
            },
        )
    }
}

impl MessageChannel for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, message: &SignalMessage) -> Result<(), ContractError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ContractError::channel(&self.name, "channel closed"))?;
        tx.send(message.clone())
            .map_err(|_| ContractError::channel(&self.name, "peer end dropped"))
    }

    async fn recv(&mut self) -> ChannelEvent {
        match self.rx.recv().await {
            Some(message) => ChannelEvent::Message(message),
            None => ChannelEvent::Closed,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

/// Hands the server end of each new pair to whoever holds the receiver.
///
/// `refuse(n)` makes the next `n` attempts fail, to exercise reconnects.
pub struct MemoryConnector {
    name: String,
    accept: mpsc::UnboundedSender<MemoryChannel>,
    queue_capacity: usize,
    refusals: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(name: &str, queue_capacity: usize) -> (Self, mpsc::UnboundedReceiver<MemoryChannel>) {
        let (accept, incoming) = mpsc::unbounded_channel();
        (
            Self {
                name: name.to_string(),
                accept,
                queue_capacity,
                refusals: AtomicUsize::new(0),
                attempts: AtomicUsize::new(0),
            },
            incoming,
        )
    }

    pub fn refuse(&self, attempts: usize) {
        self.refusals.store(attempts, Ordering::SeqCst);
    }

    /// Connect attempts so far, refused ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ChannelConnector for MemoryConnector {
    fn endpoint(&self) -> String {
        format!("memory://{}", self.name)
    }

    async fn connect(&self) -> Result<ChannelLink, SignalingError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(SignalingError::connect(self.endpoint(), "connection refused"));
        }

        let (client, server) = MemoryChannel::pair(&self.name);
        self.accept
            .send(server)
            .map_err(|_| SignalingError::connect(self.endpoint(), "no server listening"))?;
        Ok(ChannelLink::spawn(client, self.queue_capacity))
    }
}
