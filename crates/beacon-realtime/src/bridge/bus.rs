//! Notification bus abstraction.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use beacon_core::result::AppResult;

/// A shared pub/sub bus carrying serialized envelopes between instances.
///
/// Publishing is fire-and-forget: the bus offers no acknowledgment and no
/// retry, so delivery is at-most-once with whatever guarantee the backing
/// transport provides. Implementations keep publish and subscribe paths on
/// separate connections so a slow subscriber never blocks publishes.
#[async_trait]
pub trait NotificationBus: fmt::Debug + Send + Sync {
    /// Publishes a payload on the shared topic.
    async fn publish(&self, payload: String) -> AppResult<()>;

    /// Subscribes to the shared topic. Every payload published by any
    /// instance, including this one, arrives on the returned receiver.
    async fn subscribe(&self) -> AppResult<mpsc::Receiver<String>>;

    /// Disconnects the bus. Subscribers see their receivers close.
    async fn close(&self);
}
