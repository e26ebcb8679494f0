//! Channel broker and heartbeat configuration.

use serde::{Deserialize, Serialize};

/// Channel broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Heartbeat sweep interval in seconds.
    ///
    /// MUST be at least an order of magnitude larger than the expected
    /// network round-trip time, otherwise healthy connections are evicted
    /// as false positives.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Outbound frame buffer size per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_channel_buffer() -> usize {
    256
}
