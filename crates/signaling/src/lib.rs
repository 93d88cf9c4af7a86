//! # Signaling
//!
//! Peer session negotiation over a relay message channel.
//!
//! - [`SignalingSession`]: sans-IO state machine and inbound demultiplexing
//! - [`PeerConnection`] / [`PeerFactory`]: seam to the media transport
//! - [`ChannelLink`]: channel driven by a worker task with bounded queues
//! - [`ChannelConnector`]: opens links (TCP, in-memory)
//! - [`ReconnectPolicy`]: fixed-interval retry

mod connector;
mod error;
mod link;
mod peer;
mod reconnect;
mod session;
pub mod transport;

pub use connector::{ChannelConnector, LocalChannelConnector};
pub use error::SignalingError;
pub use link::{ChannelLink, LinkMetrics, LinkStats};
pub use peer::{PeerConnection, PeerFactory, StaticPeer, StaticPeerFactory};
pub use reconnect::{ReconnectPolicy, DEFAULT_RECONNECT_INTERVAL};
pub use session::{Routed, SignalingSession, SignalingState};
pub use transport::{MemoryChannel, MemoryConnector, TcpConnector, TcpJsonChannel};
