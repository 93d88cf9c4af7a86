//! # Session
//!
//! Session Controller: the composition root that owns the frame pipeline,
//! the local detector and the signaling session for one run, plus the
//! relay reconnect policy.
//!
//! [`SessionBuilder::start`] acquires the media source and spawns the
//! controller task; the returned [`SessionHandle`] queries metrics, runs
//! benchmarks, switches modes and stops the session.

mod builder;
mod controller;
mod error;
mod handle;
mod report;

pub use builder::SessionBuilder;
pub use error::SessionError;
pub use handle::{SessionHandle, StoppedSession};
pub use report::{SessionReport, SessionStatus};
