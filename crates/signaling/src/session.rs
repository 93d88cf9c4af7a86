//! Signaling State Machine
//!
//! `idle -> offering -> awaiting_answer -> connected`, with `closed` reachable
//! from anywhere. The machine is sans-IO: it returns the messages to send and
//! the caller owns the channel. One `SignalingSession` serves one connection
//! attempt; a reconnect builds a fresh one.

use std::fmt;

use contracts::{DetectionResult, IceCandidate, InferenceMode, SignalMessage};
use tracing::{debug, info, warn};

use crate::error::SignalingError;
use crate::peer::PeerConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalingState {
    Idle,
    Offering,
    AwaitingAnswer,
    Connected,
    Closed,
}

impl SignalingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Offering => "offering",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }

    /// Position in the lifecycle, for the state gauge
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Offering => 1,
            Self::AwaitingAnswer => 2,
            Self::Connected => 3,
            Self::Closed => 4,
        }
    }

    /// An offer exists, so candidates go straight to the peer
    pub fn has_session(&self) -> bool {
        matches!(
            self,
            Self::Offering | Self::AwaitingAnswer | Self::Connected
        )
    }
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of demultiplexing one inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Consumed by the state machine (answer, candidate)
    Handled,
    Detections(DetectionResult),
    Metrics(serde_json::Value),
    Config(InferenceMode),
    /// Not applicable in the current state or direction
    Ignored,
}

pub struct SignalingSession {
    state: SignalingState,
    peer: Box<dyn PeerConnection>,
    local_description: Option<String>,
    remote_description: Option<String>,
    /// Remote candidates that arrived before an offer existed
    early_candidates: Vec<IceCandidate>,
    candidates_sent: u64,
}

impl fmt::Debug for SignalingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalingSession")
            .field("state", &self.state)
            .field("has_local", &self.local_description.is_some())
            .field("has_remote", &self.remote_description.is_some())
            .field("candidates_sent", &self.candidates_sent)
            .finish()
    }
}

impl SignalingSession {
    pub fn new(peer: Box<dyn PeerConnection>) -> Self {
        Self {
            state: SignalingState::Idle,
            peer,
            local_description: None,
            remote_description: None,
            early_candidates: Vec::new(),
            candidates_sent: 0,
        }
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    pub fn local_description(&self) -> Option<&str> {
        self.local_description.as_deref()
    }

    pub fn remote_description(&self) -> Option<&str> {
        self.remote_description.as_deref()
    }

    pub fn candidates_sent(&self) -> u64 {
        self.candidates_sent
    }

    /// `idle -> offering`: create the local description and return the
    /// `offer` to send. A failed creation leaves the machine idle.
    pub fn begin_offer(&mut self) -> Result<SignalMessage, SignalingError> {
        if self.state != SignalingState::Idle {
            return Err(SignalingError::InvalidTransition {
                state: self.state,
                action: "begin offer",
            });
        }

        self.transition(SignalingState::Offering);
        let sdp = match self.peer.create_offer() {
            Ok(sdp) => sdp,
            Err(e) => {
                self.transition(SignalingState::Idle);
                return Err(e);
            }
        };
        self.local_description = Some(sdp.clone());

        for candidate in std::mem::take(&mut self.early_candidates) {
            self.apply_remote_candidate(&candidate);
        }

        Ok(SignalMessage::Offer { sdp })
    }

    /// `offering -> awaiting_answer` once the offer is on the wire
    pub fn offer_sent(&mut self) {
        if self.state == SignalingState::Offering {
            self.transition(SignalingState::AwaitingAnswer);
        }
    }

    /// Sending the offer failed; abandon the attempt until the next trigger
    pub fn offer_failed(&mut self, error: &SignalingError) {
        if self.state == SignalingState::Offering {
            warn!(error = %error, "Offer not delivered, attempt abandoned");
            self.local_description = None;
            self.transition(SignalingState::Idle);
        }
    }

    /// Demultiplex one inbound message by type
    pub fn route(&mut self, message: SignalMessage) -> Routed {
        match message {
            SignalMessage::Answer { sdp } => self.on_answer(sdp),
            SignalMessage::IceCandidate { candidate } => {
                if self.state.has_session() {
                    self.apply_remote_candidate(&candidate);
                } else if self.state == SignalingState::Idle {
                    self.early_candidates.push(candidate);
                }
                Routed::Handled
            }
            SignalMessage::Detections(result) => Routed::Detections(result),
            SignalMessage::Metrics { data } => Routed::Metrics(data),
            SignalMessage::Config { mode } => Routed::Config(mode),
            other => {
                debug!(kind = other.kind(), "Client-bound channel got a server-bound message");
                Routed::Ignored
            }
        }
    }

    fn on_answer(&mut self, sdp: String) -> Routed {
        if self.state != SignalingState::AwaitingAnswer {
            debug!(state = %self.state, "Answer ignored");
            return Routed::Ignored;
        }
        match self.peer.apply_answer(&sdp) {
            Ok(()) => {
                self.remote_description = Some(sdp);
                self.transition(SignalingState::Connected);
                Routed::Handled
            }
            Err(e) => {
                warn!(error = %e, "Answer rejected by peer");
                Routed::Ignored
            }
        }
    }

    fn apply_remote_candidate(&mut self, candidate: &IceCandidate) {
        if let Err(e) = self.peer.add_remote_candidate(candidate) {
            debug!(error = %e, "Remote candidate not applied");
        }
    }

    /// Wrap a locally gathered candidate for sending, if an offer exists
    pub fn local_candidate(&mut self, candidate: IceCandidate) -> Option<SignalMessage> {
        if !self.state.has_session() {
            debug!(state = %self.state, "Local candidate dropped");
            return None;
        }
        self.candidates_sent += 1;
        Some(SignalMessage::IceCandidate { candidate })
    }

    /// Tear down the peer; terminal for this session
    pub fn close(&mut self) {
        if self.state == SignalingState::Closed {
            return;
        }
        self.peer.close();
        self.early_candidates.clear();
        self.transition(SignalingState::Closed);
    }

    fn transition(&mut self, next: SignalingState) {
        info!(from = %self.state, to = %next, "Signaling state change");
        self.state = next;
    }
}
