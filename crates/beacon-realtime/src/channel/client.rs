//! Per-connection registry record.

use std::collections::HashSet;
use std::sync::Arc;

use crate::connection::handle::ConnectionHandle;

/// Registry record for one registered connection.
///
/// `subscriptions` is the back-reference side of the Channel↔Client
/// relation: it lists every channel whose subscriber set contains this
/// connection, so full teardown is O(subscriptions) instead of a scan over
/// all channels.
#[derive(Debug)]
pub struct ClientRecord {
    /// Transport handle for the connection.
    pub handle: Arc<ConnectionHandle>,
    /// Names of channels this connection is subscribed to.
    pub subscriptions: HashSet<String>,
    /// Liveness flag: set false when a probe is sent, flipped back true by
    /// the pong handler. Two consecutive missed probes evict.
    pub alive: bool,
}

impl ClientRecord {
    /// Creates a fresh record with no subscriptions.
    pub fn new(handle: Arc<ConnectionHandle>) -> Self {
        Self {
            handle,
            subscriptions: HashSet::new(),
            alive: true,
        }
    }
}
