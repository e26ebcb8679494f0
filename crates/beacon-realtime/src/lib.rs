//! # beacon-realtime
//!
//! Real-time notification fan-out engine for Beacon. Provides:
//!
//! - A per-instance channel broker: connection and channel registries,
//!   subscription bookkeeping, heartbeat liveness detection, and garbage
//!   collection of empty ephemeral channels
//! - The wire message contract for client requests and server notifications
//! - A multi-instance bridge that propagates publishes across server
//!   processes through a shared pub/sub bus

pub mod bridge;
pub mod channel;
pub mod connection;
pub mod message;

pub use bridge::broker::MultiInstanceBroker;
pub use channel::broker::ChannelBroker;
pub use connection::handle::{ConnectionHandle, ConnectionId, Frame};
pub use connection::pool::ConnectionPool;
