//! Channel transports: newline-delimited JSON over TCP, and in-memory pairs.

mod memory;
mod tcp;

pub use memory::{MemoryChannel, MemoryConnector};
pub use tcp::{TcpConnector, TcpJsonChannel};
