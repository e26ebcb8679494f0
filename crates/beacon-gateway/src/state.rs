//! Shared gateway state.

use std::sync::Arc;

use beacon_realtime::channel::broker::ChannelBroker;
use beacon_realtime::connection::pool::ConnectionPool;

use crate::access::AccessValidator;

/// State shared by every gateway handler.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Transport-open connections (insertion owned by the gateway).
    pub pool: Arc<ConnectionPool>,
    /// The local channel broker.
    pub broker: Arc<ChannelBroker>,
    /// Authorization seam for subscription requests.
    pub access: Arc<dyn AccessValidator>,
    /// Outbound frame buffer size per connection.
    pub buffer_size: usize,
}

impl GatewayState {
    /// Creates the gateway state.
    pub fn new(
        pool: Arc<ConnectionPool>,
        broker: Arc<ChannelBroker>,
        access: Arc<dyn AccessValidator>,
        buffer_size: usize,
    ) -> Self {
        Self {
            pool,
            broker,
            access,
            buffer_size,
        }
    }
}
