//! Transport-level connection handles and the open-connection pool.

pub mod handle;
pub mod pool;

pub use handle::{ConnectionHandle, ConnectionId, Frame};
pub use pool::ConnectionPool;
