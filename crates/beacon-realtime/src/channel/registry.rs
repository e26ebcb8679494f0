//! Connection and channel registries.
//!
//! `Channel.subscribers` and `ClientRecord.subscriptions` are two views of
//! the same relation. Every mutating method here updates both sides before
//! returning, so the invariant
//!
//! `conn ∈ channels[name].subscribers ⇔ name ∈ clients[conn].subscriptions`
//!
//! holds after every operation. Nothing outside this type touches the maps.

use std::collections::HashMap;
use std::sync::Arc;

use crate::connection::handle::{ConnectionHandle, ConnectionId};

use super::channel::Channel;
use super::client::ClientRecord;

/// Both registries, mutated together under one lock in the broker.
#[derive(Debug, Default)]
pub struct Registry {
    /// Channel name → channel.
    channels: HashMap<String, Channel>,
    /// Connection ID → client record.
    clients: HashMap<ConnectionId, ClientRecord>,
}

impl Registry {
    /// Creates an empty registry pair.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh client record with no subscriptions.
    pub fn register(&mut self, handle: Arc<ConnectionHandle>) {
        self.clients.insert(handle.id, ClientRecord::new(handle));
    }

    /// Drops a client record, detaching it from every channel it was
    /// subscribed to. Returns the record if one existed.
    pub fn remove_client(&mut self, conn_id: &ConnectionId) -> Option<ClientRecord> {
        let record = self.clients.remove(conn_id)?;
        for name in &record.subscriptions {
            if let Some(channel) = self.channels.get_mut(name) {
                channel.subscribers.remove(conn_id);
            }
        }
        Some(record)
    }

    /// Inserts an empty channel, overwriting any channel with the same name.
    /// Subscribers of the replaced channel are detached first so no stale
    /// back-reference survives the overwrite.
    pub fn create_channel(&mut self, name: &str, remove_if_empty: bool) {
        self.delete_channel(name, false);
        self.channels
            .insert(name.to_string(), Channel::new(name.to_string(), remove_if_empty));
    }

    /// Deletes a channel, detaching every subscriber's back-reference.
    ///
    /// With `only_if_empty` set, the channel is only deleted when it is
    /// flagged `remove_if_empty` and has no subscribers left.
    pub fn delete_channel(&mut self, name: &str, only_if_empty: bool) -> bool {
        if only_if_empty {
            match self.channels.get(name) {
                Some(channel) if channel.remove_if_empty && channel.is_empty() => {}
                _ => return false,
            }
        }
        let Some(channel) = self.channels.remove(name) else {
            return false;
        };
        for conn_id in &channel.subscribers {
            if let Some(record) = self.clients.get_mut(conn_id) {
                record.subscriptions.remove(name);
            }
        }
        true
    }

    /// Subscribes a registered connection to an existing channel.
    pub fn subscribe(&mut self, conn_id: &ConnectionId, name: &str) -> bool {
        let Some(channel) = self.channels.get_mut(name) else {
            return false;
        };
        let Some(record) = self.clients.get_mut(conn_id) else {
            return false;
        };
        channel.subscribers.insert(*conn_id);
        record.subscriptions.insert(name.to_string());
        true
    }

    /// Subscribes to a single channel, dropping every prior subscription of
    /// this connection first.
    pub fn subscribe_only(&mut self, conn_id: &ConnectionId, name: &str) -> bool {
        if let Some(record) = self.clients.get_mut(conn_id) {
            let previous = std::mem::take(&mut record.subscriptions);
            for prior in &previous {
                if let Some(channel) = self.channels.get_mut(prior) {
                    channel.subscribers.remove(conn_id);
                }
            }
        }
        self.subscribe(conn_id, name)
    }

    /// Removes both sides of a single subscription.
    pub fn unsubscribe(&mut self, conn_id: &ConnectionId, name: &str) -> bool {
        let Some(channel) = self.channels.get_mut(name) else {
            return false;
        };
        let Some(record) = self.clients.get_mut(conn_id) else {
            return false;
        };
        channel.subscribers.remove(conn_id);
        record.subscriptions.remove(name)
    }

    /// Returns the handles of every subscriber of a channel, or `None` if
    /// the channel does not exist.
    pub fn subscriber_handles(&self, name: &str) -> Option<Vec<Arc<ConnectionHandle>>> {
        let channel = self.channels.get(name)?;
        Some(
            channel
                .subscribers
                .iter()
                .filter_map(|conn_id| self.clients.get(conn_id))
                .map(|record| record.handle.clone())
                .collect(),
        )
    }

    /// Flips a client's liveness flag back on (probe acknowledged).
    pub fn record_pong(&mut self, conn_id: &ConnectionId) -> bool {
        match self.clients.get_mut(conn_id) {
            Some(record) => {
                record.alive = true;
                true
            }
            None => false,
        }
    }

    /// Liveness pass of the heartbeat sweep, atomic over the registries.
    ///
    /// Clients whose previous probe went unacknowledged are torn down (same
    /// path as [`Registry::remove_client`]) and returned for transport
    /// termination. Every surviving client is marked not-alive and its
    /// handle returned so the caller can send the next probe.
    pub fn liveness_pass(&mut self) -> (Vec<ClientRecord>, Vec<Arc<ConnectionHandle>>) {
        let dead: Vec<ConnectionId> = self
            .clients
            .iter()
            .filter(|(_, record)| !record.alive)
            .map(|(conn_id, _)| *conn_id)
            .collect();

        let mut evicted = Vec::with_capacity(dead.len());
        for conn_id in &dead {
            if let Some(record) = self.remove_client(conn_id) {
                evicted.push(record);
            }
        }

        let mut probes = Vec::with_capacity(self.clients.len());
        for record in self.clients.values_mut() {
            record.alive = false;
            probes.push(record.handle.clone());
        }

        (evicted, probes)
    }

    /// Channel GC pass: deletes every channel flagged `remove_if_empty`
    /// that has no subscribers left. Returns the deleted names.
    pub fn gc_empty_channels(&mut self) -> Vec<String> {
        let doomed: Vec<String> = self
            .channels
            .values()
            .filter(|channel| channel.remove_if_empty && channel.is_empty())
            .map(|channel| channel.name.clone())
            .collect();
        for name in &doomed {
            self.delete_channel(name, false);
        }
        doomed
    }

    /// Whether a connection has a registry record.
    pub fn is_registered(&self, conn_id: &ConnectionId) -> bool {
        self.clients.contains_key(conn_id)
    }

    /// Whether a channel exists.
    pub fn channel_exists(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of registered clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Snapshot of a connection's subscriptions.
    pub fn subscriptions_of(&self, conn_id: &ConnectionId) -> Vec<String> {
        self.clients
            .get(conn_id)
            .map(|record| record.subscriptions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Subscriber count of a channel, 0 if absent.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.channels
            .get(name)
            .map(|channel| channel.subscriber_count())
            .unwrap_or(0)
    }

    /// Checks the dual-index invariant; used by tests after mutation
    /// sequences.
    #[cfg(test)]
    pub fn check_consistency(&self) -> bool {
        let forward_ok = self.channels.values().all(|channel| {
            channel.subscribers.iter().all(|conn_id| {
                self.clients
                    .get(conn_id)
                    .is_some_and(|record| record.subscriptions.contains(&channel.name))
            })
        });
        let backward_ok = self.clients.iter().all(|(conn_id, record)| {
            record.subscriptions.iter().all(|name| {
                self.channels
                    .get(name)
                    .is_some_and(|channel| channel.subscribers.contains(conn_id))
            })
        });
        forward_ok && backward_ok
    }
}
