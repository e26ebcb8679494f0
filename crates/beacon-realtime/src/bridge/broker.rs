//! Multi-instance channels broker.
//!
//! Makes `send_to_channel`/`broadcast` semantics hold across a fleet of
//! broker instances sharing one bus. Dispatching does not special-case the
//! originating instance: its own relay receives the message back and
//! delivers it locally, so local and remote delivery share one code path.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use beacon_core::result::AppResult;

use crate::channel::broker::ChannelBroker;
use crate::message::types::ServerMessage;

use super::bus::NotificationBus;
use super::envelope::{BusEnvelope, ChannelScope};

/// Bridge between one local channel broker and the shared bus.
#[derive(Debug)]
pub struct MultiInstanceBroker {
    /// The shared bus.
    bus: Arc<dyn NotificationBus>,
    /// Cancelled on close; stops the relay task.
    relay_stop: CancellationToken,
}

impl MultiInstanceBroker {
    /// Subscribes to the shared topic and starts relaying inbound bus
    /// messages into the local broker's fan-out paths.
    pub async fn new(
        channels: Arc<ChannelBroker>,
        bus: Arc<dyn NotificationBus>,
    ) -> AppResult<Self> {
        let rx = bus.subscribe().await?;
        let relay_stop = CancellationToken::new();
        spawn_relay(channels, rx, relay_stop.clone());
        Ok(Self { bus, relay_stop })
    }

    /// Sends a notification across instances, INCLUDING this one.
    ///
    /// Fire-and-forget: a publish failure is logged as degradation and the
    /// notification is dropped; there is no retry, which keeps delivery
    /// at-most-once.
    pub async fn dispatch(&self, notif: ServerMessage, scope: ChannelScope) {
        let envelope = BusEnvelope::new(notif, scope);
        let payload = match envelope.serialize() {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "failed to serialize bus envelope");
                return;
            }
        };
        if let Err(e) = self.bus.publish(payload).await {
            warn!(error = %e, "bus publish failed, notification dropped; continuing local-only");
        }
    }

    /// Stops the relay and disconnects the bus. Call exactly once during
    /// orderly shutdown; the wrapped broker's lifecycle is not touched.
    pub async fn close(&self) {
        self.relay_stop.cancel();
        self.bus.close().await;
    }
}

fn spawn_relay(
    channels: Arc<ChannelBroker>,
    mut rx: mpsc::Receiver<String>,
    stop: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                received = rx.recv() => {
                    let Some(payload) = received else { break };
                    let Some(envelope) = BusEnvelope::parse(&payload) else {
                        warn!(payload = %payload, "malformed bus message dropped");
                        continue;
                    };
                    match envelope.channel {
                        ChannelScope::Broadcast => {
                            channels.broadcast(&envelope.notif);
                        }
                        ChannelScope::Channel(name) => {
                            channels.send_to_channel(&name, &envelope.notif);
                        }
                    }
                }
            }
        }
        debug!("bus relay stopped");
    });
}
