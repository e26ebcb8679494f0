//! Redis-backed notification bus.
//!
//! Holds two connections: a pooled publisher and a dedicated pub/sub
//! subscriber, kept separate so a slow subscriber callback never blocks
//! outbound publishes. Reconnection policy is left to the Redis client;
//! this layer only reports errors.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use beacon_core::config::bus::BusConfig;
use beacon_core::error::{AppError, ErrorKind};
use beacon_core::result::AppResult;

use super::bus::NotificationBus;

/// Redis pub/sub notification bus.
#[derive(Debug)]
pub struct RedisBus {
    /// Client handle, used to open the subscriber connection.
    client: redis::Client,
    /// Dedicated publish connection (pooled, reconnecting).
    publisher: ConnectionManager,
    /// Shared topic all instances publish on.
    topic: String,
    /// Cancelled on close; stops subscriber readers.
    closed: CancellationToken,
}

impl RedisBus {
    /// Connects the publish side of the bus.
    pub async fn connect(config: &BusConfig) -> AppResult<Self> {
        let url = config.url();
        info!(url = %mask_redis_url(&url), topic = %config.topic, "Connecting to notification bus");

        let client = redis::Client::open(url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Bus, "Failed to create Redis client", e)
        })?;

        let publisher = ConnectionManager::new(client.clone()).await.map_err(|e| {
            AppError::with_source(ErrorKind::Bus, "Failed to connect to Redis", e)
        })?;

        info!("Notification bus connected");
        Ok(Self {
            client,
            publisher,
            topic: config.topic.clone(),
            closed: CancellationToken::new(),
        })
    }
}

#[async_trait]
impl NotificationBus for RedisBus {
    async fn publish(&self, payload: String) -> AppResult<()> {
        let mut conn = self.publisher.clone();
        redis::cmd("PUBLISH")
            .arg(&self.topic)
            .arg(payload)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Bus, "Bus publish failed", e))?;
        Ok(())
    }

    async fn subscribe(&self) -> AppResult<mpsc::Receiver<String>> {
        let mut pubsub = self.client.get_async_pubsub().await.map_err(|e| {
            AppError::with_source(ErrorKind::Bus, "Failed to open bus subscriber", e)
        })?;
        pubsub.subscribe(&self.topic).await.map_err(|e| {
            AppError::with_source(ErrorKind::Bus, "Failed to subscribe to bus topic", e)
        })?;

        let (tx, rx) = mpsc::channel(256);
        let closed = self.closed.clone();
        let topic = self.topic.clone();
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            loop {
                tokio::select! {
                    _ = closed.cancelled() => break,
                    msg = stream.next() => {
                        let Some(msg) = msg else { break };
                        let payload: String = match msg.get_payload() {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(topic = %topic, error = %e, "non-text bus payload dropped");
                                continue;
                            }
                        };
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(topic = %topic, "bus subscriber stopped");
        });
        Ok(rx)
    }

    async fn close(&self) {
        self.closed.cancel();
    }
}

/// Mask password in Redis URL for safe logging.
fn mask_redis_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
