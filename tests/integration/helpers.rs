//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use beacon_core::config::realtime::RealtimeConfig;
use beacon_gateway::{AllowAll, GatewayState};
use beacon_realtime::bridge::broker::MultiInstanceBroker;
use beacon_realtime::bridge::bus::NotificationBus;
use beacon_realtime::bridge::memory_bus::MemoryBus;
use beacon_realtime::channel::broker::ChannelBroker;
use beacon_realtime::connection::pool::ConnectionPool;

/// One running server instance bound to an ephemeral port.
pub struct TestApp {
    /// WebSocket endpoint URL.
    pub ws_url: String,
    /// The instance's local channel broker.
    pub broker: Arc<ChannelBroker>,
    /// The instance's cross-instance bridge.
    pub bridge: Arc<MultiInstanceBroker>,
    /// The instance's connection pool.
    pub pool: Arc<ConnectionPool>,
}

impl TestApp {
    /// Starts an instance on its own in-process bus.
    pub async fn new() -> Self {
        Self::with_bus(Arc::new(MemoryBus::new(64))).await
    }

    /// Starts an instance wired to the given bus. Two instances sharing a
    /// cloned [`MemoryBus`] behave like two processes on one Redis topic.
    pub async fn with_bus(bus: Arc<dyn NotificationBus>) -> Self {
        let config = RealtimeConfig::default();

        let pool = Arc::new(ConnectionPool::new());
        let broker = ChannelBroker::new(&config, Arc::clone(&pool));
        let bridge = Arc::new(
            MultiInstanceBroker::new(Arc::clone(&broker), bus)
                .await
                .expect("bus subscription failed"),
        );

        let state = GatewayState::new(
            Arc::clone(&pool),
            Arc::clone(&broker),
            Arc::new(AllowAll),
            config.channel_buffer_size,
        );
        let app = beacon_gateway::router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("no local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server error");
        });

        Self {
            ws_url: format!("ws://{}/ws", addr),
            broker,
            bridge,
            pool,
        }
    }

    /// Opens a WebSocket client against this instance.
    pub async fn connect(&self) -> WsClient {
        let (stream, _) = connect_async(&self.ws_url)
            .await
            .expect("WebSocket connect failed");
        WsClient { stream }
    }
}

/// A WebSocket client speaking JSON text frames.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Sends one text frame.
    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .expect("send failed");
    }

    /// Sends a JSON value as a text frame.
    pub async fn send_json(&mut self, value: &Value) {
        self.send_text(&value.to_string()).await;
    }

    /// Receives the next text frame as JSON, skipping control frames.
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.stream.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("stream error");
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("non-JSON text frame");
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Asserts that no text frame arrives within the window.
    pub async fn expect_silence(&mut self, window: Duration) {
        let outcome = tokio::time::timeout(window, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    other => return other,
                }
            }
        })
        .await;
        if let Ok(frame) = outcome {
            panic!("expected silence, got {frame:?}");
        }
    }

    /// Closes the client side of the connection.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// A well-formed subscribe request.
pub fn subscribe_request(channel: &str, entity: &str) -> Value {
    serde_json::json!({
        "realm": "notif",
        "action": "subscribe",
        "channel": channel,
        "entity": entity,
    })
}

/// A well-formed unsubscribe request.
pub fn unsubscribe_request(channel: &str) -> Value {
    serde_json::json!({
        "realm": "notif",
        "action": "unsubscribe",
        "channel": channel,
    })
}

/// Waits until the instance sees the expected number of registered clients.
pub async fn wait_for_clients(broker: &ChannelBroker, expected: usize) {
    for _ in 0..100 {
        if broker.client_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} registered clients, have {}",
        expected,
        broker.client_count()
    );
}

/// Waits until the channel reaches the expected subscriber count.
pub async fn wait_for_subscribers(broker: &ChannelBroker, channel: &str, expected: usize) {
    for _ in 0..100 {
        if broker.subscriber_count(channel) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} subscribers on \"{}\", have {}",
        expected,
        channel,
        broker.subscriber_count(channel)
    );
}
