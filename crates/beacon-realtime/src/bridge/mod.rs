//! Multi-instance bridge: propagates publishes across server processes
//! through a shared pub/sub bus.

pub mod broker;
pub mod bus;
pub mod envelope;
pub mod memory_bus;
pub mod redis_bus;

pub use broker::MultiInstanceBroker;
pub use bus::NotificationBus;
pub use envelope::{BusEnvelope, ChannelScope};
pub use memory_bus::MemoryBus;
pub use redis_bus::RedisBus;
