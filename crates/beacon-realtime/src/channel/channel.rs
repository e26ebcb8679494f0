//! Single named channel with subscriber tracking.

use std::collections::HashSet;

use crate::connection::handle::ConnectionId;

/// A named channel clients can subscribe to.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Channel name.
    pub name: String,
    /// Set of subscribed connection IDs.
    pub subscribers: HashSet<ConnectionId>,
    /// Whether the heartbeat sweep garbage-collects this channel once it
    /// has no subscribers left.
    pub remove_if_empty: bool,
}

impl Channel {
    /// Creates a new empty channel.
    pub fn new(name: String, remove_if_empty: bool) -> Self {
        Self {
            name,
            subscribers: HashSet::new(),
            remove_if_empty,
        }
    }

    /// Returns whether the channel has any subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Returns subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
