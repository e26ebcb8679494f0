//! Channel broker: registries, subscription bookkeeping, heartbeat sweep.

pub mod broker;
pub mod channel;
pub mod client;
pub mod registry;

pub use broker::ChannelBroker;
pub use channel::Channel;
pub use client::ClientRecord;
