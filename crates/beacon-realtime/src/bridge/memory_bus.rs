//! In-memory bus for single-process deployments and tests.
//!
//! Two bridges sharing one `MemoryBus` behave like two server instances
//! sharing one Redis topic, which is how the multi-instance path is tested
//! without a running Redis.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use beacon_core::result::AppResult;

use super::bus::NotificationBus;

/// In-process notification bus backed by a tokio broadcast channel.
#[derive(Debug)]
pub struct MemoryBus {
    /// Shared topic.
    tx: broadcast::Sender<String>,
    /// Cancelled on close; stops this handle's subscriber forwarders.
    closed: CancellationToken,
}

impl MemoryBus {
    /// Creates a bus with the given topic buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self {
            tx,
            closed: CancellationToken::new(),
        }
    }
}

/// Cloning models a separate connection to the same topic: the clone shares
/// the topic but closes independently, like one instance's Redis client.
impl Clone for MemoryBus {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            closed: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl NotificationBus for MemoryBus {
    async fn publish(&self, payload: String) -> AppResult<()> {
        // a send error only means nobody is subscribed yet
        let _ = self.tx.send(payload);
        Ok(())
    }

    async fn subscribe(&self) -> AppResult<mpsc::Receiver<String>> {
        let mut topic_rx = self.tx.subscribe();
        let (tx, rx) = mpsc::channel(64);
        let closed = self.closed.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = closed.cancelled() => break,
                    received = topic_rx.recv() => match received {
                        Ok(payload) => {
                            if tx.send(payload).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "memory bus subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn close(&self) {
        self.closed.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_receives_each_publish() {
        let bus = MemoryBus::new(16);
        let mut rx_a = bus.subscribe().await.unwrap();
        let mut rx_b = bus.subscribe().await.unwrap();

        bus.publish("one".to_string()).await.unwrap();
        assert_eq!(rx_a.recv().await, Some("one".to_string()));
        assert_eq!(rx_b.recv().await, Some("one".to_string()));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = MemoryBus::new(16);
        assert!(bus.publish("dropped".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_close_ends_subscribers() {
        let bus = MemoryBus::new(16);
        let mut rx = bus.subscribe().await.unwrap();
        bus.close().await;
        assert_eq!(rx.recv().await, None);
    }
}
