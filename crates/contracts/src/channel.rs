//! MessageChannel trait - relay channel interface
//!
//! The transport library is a black box; the core only needs ordered,
//! bidirectional delivery of [`SignalMessage`]s and a close notification.

use crate::{ContractError, SignalMessage};

/// Inbound event from a message channel
#[derive(Debug)]
pub enum ChannelEvent {
    Message(SignalMessage),
    /// Peer closed the channel cleanly
    Closed,
    /// Transport failure; the channel is unusable afterwards
    Error(ContractError),
}

impl ChannelEvent {
    /// Closed and Error both end the channel
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Error(_))
    }
}

/// Bidirectional message channel
///
/// `recv` must be cancel-safe: it is raced against outbound traffic.
#[trait_variant::make(MessageChannel: Send)]
pub trait LocalMessageChannel {
    /// Channel name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one message
    ///
    /// # Errors
    /// Returns `ContractError::Channel` if the channel is closed
    async fn send(&mut self, message: &SignalMessage) -> Result<(), ContractError>;

    /// Wait for the next inbound event
    async fn recv(&mut self) -> ChannelEvent;

    /// Close the channel
    async fn close(&mut self) -> Result<(), ContractError>;
}
