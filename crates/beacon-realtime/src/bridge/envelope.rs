//! Bus envelope: the message shape crossing the inter-instance bus.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::message::types::{Realm, ServerMessage};

/// Sentinel channel value meaning "deliver to every connection".
const BROADCAST_SENTINEL: &str = "broadcast";

/// Delivery scope of a dispatched notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelScope {
    /// Deliver to every connection of every instance.
    Broadcast,
    /// Deliver to the subscribers of one named channel on every instance.
    Channel(String),
}

impl ChannelScope {
    /// Scope for a named channel.
    pub fn channel(name: impl Into<String>) -> Self {
        Self::Channel(name.into())
    }

    /// Wire string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Broadcast => BROADCAST_SENTINEL,
            Self::Channel(name) => name,
        }
    }
}

impl Serialize for ChannelScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        if name.is_empty() {
            return Err(D::Error::custom("empty channel name"));
        }
        Ok(if name == BROADCAST_SENTINEL {
            Self::Broadcast
        } else {
            Self::Channel(name)
        })
    }
}

/// Envelope wrapping a server message for transit over the bus.
///
/// Transient: constructed per publish, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEnvelope {
    /// Realm guard, must be `notif`.
    pub realm: Realm,
    /// Delivery scope.
    pub channel: ChannelScope,
    /// The notification to fan out locally on each instance.
    pub notif: ServerMessage,
}

impl BusEnvelope {
    /// Wraps a notification for transit.
    pub fn new(notif: ServerMessage, channel: ChannelScope) -> Self {
        Self {
            realm: Realm::Notif,
            channel,
            notif,
        }
    }

    /// Serializes to the wire JSON shared by all instances.
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a bus payload; `None` for anything malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
