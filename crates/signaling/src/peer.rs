//! Peer media session seam.
//!
//! The media transport is external; the state machine only needs to create
//! an offer, apply an answer and feed remote candidates. Locally gathered
//! candidates are delivered on an event stream handed out at construction.

use contracts::IceCandidate;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SignalingError;

pub trait PeerConnection: Send {
    /// Create and install the local description
    fn create_offer(&mut self) -> Result<String, SignalingError>;

    fn apply_answer(&mut self, sdp: &str) -> Result<(), SignalingError>;

    fn add_remote_candidate(&mut self, candidate: &IceCandidate) -> Result<(), SignalingError>;

    fn close(&mut self);
}

/// Builds one peer per connection attempt; attempts never share a peer.
pub trait PeerFactory: Send + 'static {
    fn create(&mut self) -> Box<dyn PeerConnection>;
}

/// Loopback peer for headless runs: a fixed SDP and one host candidate per offer.
pub struct StaticPeer {
    id: u64,
    candidates: mpsc::UnboundedSender<IceCandidate>,
    local_description: Option<String>,
    remote_description: Option<String>,
    remote_candidates: Vec<IceCandidate>,
    closed: bool,
}

impl StaticPeer {
    pub fn new(id: u64, candidates: mpsc::UnboundedSender<IceCandidate>) -> Self {
        Self {
            id,
            candidates,
            local_description: None,
            remote_description: None,
            remote_candidates: Vec::new(),
            closed: false,
        }
    }

    pub fn remote_description(&self) -> Option<&str> {
        self.remote_description.as_deref()
    }

    pub fn remote_candidates(&self) -> &[IceCandidate] {
        &self.remote_candidates
    }

    fn offer_sdp(&self) -> String {
        format!(
            "v=0\r\no=- {} 1 IN IP4 127.0.0.1\r\ns=visionlink\r\nt=0 0\r\n\
             m=video 9 UDP/TLS/RTP/SAVPF 96\r\nc=IN IP4 0.0.0.0\r\na=mid:0\r\na=sendonly\r\n\
             a=rtpmap:96 VP8/90000\r\n",
            self.id
        )
    }

    fn host_candidate(&self) -> IceCandidate {
        IceCandidate(json!({
            "candidate": format!("candidate:{} 1 udp 2122260223 127.0.0.1 9 typ host", self.id),
            "sdpMid": "0",
            "sdpMLineIndex": 0,
        }))
    }
}

impl PeerConnection for StaticPeer {
    fn create_offer(&mut self) -> Result<String, SignalingError> {
        if self.closed {
            return Err(SignalingError::OfferFailed {
                message: "peer connection is closed".into(),
            });
        }
        let sdp = self.offer_sdp();
        self.local_description = Some(sdp.clone());
        // gathering completes immediately on loopback
        let _ = self.candidates.send(self.host_candidate());
        Ok(sdp)
    }

    fn apply_answer(&mut self, sdp: &str) -> Result<(), SignalingError> {
        if self.local_description.is_none() {
            return Err(SignalingError::peer("answer before offer"));
        }
        if !sdp.starts_with("v=") {
            return Err(SignalingError::peer("answer is not a session description"));
        }
        self.remote_description = Some(sdp.to_string());
        Ok(())
    }

    fn add_remote_candidate(&mut self, candidate: &IceCandidate) -> Result<(), SignalingError> {
        if self.closed {
            return Err(SignalingError::peer("peer connection is closed"));
        }
        self.remote_candidates.push(candidate.clone());
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            debug!(peer = self.id, "Peer connection closed");
        }
    }
}

/// Factory for [`StaticPeer`]s sharing one candidate stream
pub struct StaticPeerFactory {
    next_id: u64,
    candidates: mpsc::UnboundedSender<IceCandidate>,
}

impl StaticPeerFactory {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<IceCandidate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                next_id: 1,
                candidates: tx,
            },
            rx,
        )
    }
}

impl PeerFactory for StaticPeerFactory {
    fn create(&mut self) -> Box<dyn PeerConnection> {
        let peer = StaticPeer::new(self.next_id, self.candidates.clone());
        self.next_id += 1;
        Box::new(peer)
    }
}
