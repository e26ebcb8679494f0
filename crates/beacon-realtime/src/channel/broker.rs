//! Channel broker: public operations and the heartbeat sweep.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use beacon_core::config::realtime::RealtimeConfig;

use crate::connection::handle::{ConnectionHandle, ConnectionId, Frame};
use crate::connection::pool::ConnectionPool;
use crate::message::contract;
use crate::message::types::ServerMessage;

use super::registry::Registry;

/// Per-instance channel broker.
///
/// Owns the connection and channel registries behind one lock; every public
/// operation is a single short critical section with no await inside, so no
/// mutation ever observes the registries half-updated. The heartbeat sweep
/// is an owned timer task per broker instance, which allows multiple
/// independent brokers in one process.
#[derive(Debug)]
pub struct ChannelBroker {
    /// Transport-open connections (shared with the acceptor).
    pool: Arc<ConnectionPool>,
    /// Connection and channel registries.
    registry: Mutex<Registry>,
    /// Cancelled on shutdown; stops the sweeper task.
    shutdown: CancellationToken,
}

impl ChannelBroker {
    /// Creates a broker and starts its heartbeat sweeper.
    ///
    /// The sweep interval MUST be at least an order of magnitude larger
    /// than the expected network round-trip time, otherwise healthy
    /// connections miss their pong window and are evicted.
    pub fn new(config: &RealtimeConfig, pool: Arc<ConnectionPool>) -> Arc<Self> {
        let broker = Arc::new(Self {
            pool,
            registry: Mutex::new(Registry::new()),
            shutdown: CancellationToken::new(),
        });
        broker.spawn_sweeper(Duration::from_secs(config.heartbeat_interval_seconds));
        broker
    }

    /// Stops the heartbeat sweeper. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().expect("registry lock poisoned")
    }

    /// Registers a new connection with a fresh, empty record.
    pub fn register(&self, handle: Arc<ConnectionHandle>) {
        debug!(conn_id = %handle.id, "connection registered");
        self.lock().register(handle);
    }

    /// Removes a connection, detaching it from every subscribed channel.
    /// Returns `false` if no record existed.
    pub fn remove(&self, conn_id: &ConnectionId) -> bool {
        let removed = self.lock().remove_client(conn_id).is_some();
        if removed {
            debug!(conn_id = %conn_id, "connection removed");
        }
        removed
    }

    /// Creates an empty channel. Reusing a name replaces the old channel.
    pub fn create_channel(&self, name: &str, remove_if_empty: bool) {
        self.lock().create_channel(name, remove_if_empty);
    }

    /// Deletes a channel. With `only_if_empty`, only channels flagged
    /// `remove_if_empty` that have no subscribers are deleted.
    pub fn delete_channel(&self, name: &str, only_if_empty: bool) -> bool {
        self.lock().delete_channel(name, only_if_empty)
    }

    /// Subscribes a registered connection to an existing channel.
    pub fn subscribe(&self, conn_id: &ConnectionId, name: &str) -> bool {
        self.lock().subscribe(conn_id, name)
    }

    /// Subscribes to a single channel, dropping all prior subscriptions.
    pub fn subscribe_only(&self, conn_id: &ConnectionId, name: &str) -> bool {
        self.lock().subscribe_only(conn_id, name)
    }

    /// Unsubscribes a connection from a channel.
    pub fn unsubscribe(&self, conn_id: &ConnectionId, name: &str) -> bool {
        self.lock().unsubscribe(conn_id, name)
    }

    /// Sends a message to every subscriber of a channel.
    ///
    /// The message is serialized once. Returns `false` if the channel does
    /// not exist or any subscriber rejected the write (closed or full).
    pub fn send_to_channel(&self, name: &str, message: &ServerMessage) -> bool {
        let payload = match contract::serialize(message) {
            Ok(payload) => payload,
            Err(e) => {
                error!(channel = %name, error = %e, "failed to serialize channel message");
                return false;
            }
        };

        let handles = match self.lock().subscriber_handles(name) {
            Some(handles) => handles,
            None => return false,
        };

        let mut ok = true;
        for handle in handles {
            ok &= handle.send(Frame::Text(payload.clone()));
        }
        ok
    }

    /// Sends a message to every transport-open connection, independent of
    /// channel membership.
    pub fn broadcast(&self, message: &ServerMessage) -> bool {
        let payload = match contract::serialize(message) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "failed to serialize broadcast message");
                return false;
            }
        };

        let mut ok = true;
        for handle in self.pool.all_connections() {
            ok &= handle.send(Frame::Text(payload.clone()));
        }
        ok
    }

    /// Records a pong for a connection, keeping it alive for the next
    /// sweep tick.
    pub fn record_pong(&self, conn_id: &ConnectionId) {
        self.lock().record_pong(conn_id);
    }

    /// Runs one heartbeat sweep immediately: orphan ejection, liveness
    /// eviction, and channel garbage collection. Each pass is atomic with
    /// respect to the registries.
    pub fn sweep(&self) {
        // Orphan pass: transport-open connections that never registered.
        {
            let registry = self.lock();
            for handle in self.pool.all_connections() {
                if !registry.is_registered(&handle.id) {
                    info!(conn_id = %handle.id, "ejecting orphan connection without registration");
                    handle.terminate();
                    self.pool.remove(&handle.id);
                }
            }
        }

        // Liveness pass: evict clients that missed two consecutive probes,
        // probe everyone else.
        let (evicted, probes) = self.lock().liveness_pass();
        for record in &evicted {
            info!(conn_id = %record.handle.id, "ejecting connection, heartbeat timeout");
            record.handle.terminate();
            self.pool.remove(&record.handle.id);
        }
        for handle in probes {
            handle.send(Frame::Ping);
        }

        // Channel GC pass: drop empty ephemeral channels.
        let removed = self.lock().gc_empty_channels();
        for name in removed {
            info!(channel = %name, "removed empty ephemeral channel");
        }
    }

    /// Whether a connection is registered.
    pub fn is_registered(&self, conn_id: &ConnectionId) -> bool {
        self.lock().is_registered(conn_id)
    }

    /// Whether a channel exists.
    pub fn channel_exists(&self, name: &str) -> bool {
        self.lock().channel_exists(name)
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.lock().channel_count()
    }

    /// Number of registered connections.
    pub fn client_count(&self) -> usize {
        self.lock().client_count()
    }

    /// Snapshot of a connection's subscriptions.
    pub fn subscriptions_of(&self, conn_id: &ConnectionId) -> Vec<String> {
        self.lock().subscriptions_of(conn_id)
    }

    /// Subscriber count of a channel, 0 if absent.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.lock().subscriber_count(name)
    }

    fn spawn_sweeper(self: &Arc<Self>, interval: Duration) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the immediate first tick would probe before anyone connected
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                match weak.upgrade() {
                    Some(broker) => broker.sweep(),
                    None => break,
                }
            }
            debug!("heartbeat sweeper stopped");
        });
    }
}

impl Drop for ChannelBroker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
