//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock milliseconds since the Unix epoch, read through [`Clock`]
//! - `frame_id` is the only correlation key between dispatch and result;
//!   results may arrive in any order

mod channel;
mod clock;
mod detection;
mod error;
mod frame;
mod frame_id;
mod media_source;
mod message;
mod render;
mod session_config;
mod telemetry;

pub use channel::*;
pub use clock::*;
pub use detection::*;
pub use error::*;
pub use frame::*;
pub use frame_id::FrameId;
pub use media_source::MediaSource;
pub use message::*;
pub use render::*;
pub use session_config::*;
pub use telemetry::*;
