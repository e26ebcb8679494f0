//! Inbound and outbound message type definitions.
//!
//! Every message carries the fixed `realm` tag as a namespace guard; a
//! message with any other realm value fails to parse. The discriminator
//! fields (`action`, `type`, `entity`) are enforced by serde's tagged enum
//! representation before any other field is touched.

use serde::{Deserialize, Serialize};

/// Namespace/version guard present on every wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Realm {
    /// The notification realm. Currently the only valid value.
    #[serde(rename = "notif")]
    Notif,
}

/// Entity kind a subscription request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// An item and its children.
    Item,
    /// A member and resources shared with them.
    Member,
    /// An item chat thread.
    Chat,
}

/// Messages sent by the client to the server, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    /// The client is leaving; tear down its registrations.
    Disconnect {
        /// Realm guard.
        realm: Realm,
    },
    /// Subscribe to a channel.
    Subscribe {
        /// Realm guard.
        realm: Realm,
        /// Channel name.
        channel: String,
        /// Entity the channel is tied to.
        entity: EntityType,
    },
    /// Unsubscribe from a channel.
    Unsubscribe {
        /// Realm guard.
        realm: Realm,
        /// Channel name.
        channel: String,
    },
    /// Subscribe to a channel, dropping all prior subscriptions first.
    SubscribeOnly {
        /// Realm guard.
        realm: Realm,
        /// Channel name.
        channel: String,
        /// Entity the channel is tied to.
        entity: EntityType,
    },
}

/// Request outcome carried in a response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The request was honored.
    Success,
    /// The request was rejected; see the `error` field.
    Error,
}

/// Wire-level error identifiers surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorName {
    /// The authorization layer rejected the subscription.
    AccessDenied,
    /// The inbound bytes failed message contract validation.
    InvalidRequest,
    /// The target channel or entity does not exist.
    NotFound,
    /// An unexpected failure occurred while servicing the request.
    ServerError,
}

/// Error details attached to an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error identifier.
    pub name: ErrorName,
    /// Human-readable description. Kept generic for unexpected failures;
    /// the full detail is logged server-side only.
    pub message: String,
}

/// Messages sent by the server to the client, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Outcome of a client request, echoing the request for correlation.
    Response {
        /// Realm guard.
        realm: Realm,
        /// Request outcome.
        status: ResponseStatus,
        /// Error details when the status is `error`.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ErrorInfo>,
        /// The original request, echoed back when available.
        #[serde(skip_serializing_if = "Option::is_none")]
        request: Option<ClientMessage>,
    },
    /// Informational message pushed by the server.
    Info {
        /// Realm guard.
        realm: Realm,
        /// Message text.
        message: String,
        /// Opaque extra payload; the core never inspects it.
        #[serde(skip_serializing_if = "Option::is_none")]
        extra: Option<serde_json::Value>,
    },
    /// A domain update fanned out on a channel.
    Update {
        /// Realm guard.
        realm: Realm,
        /// Channel the update was published on.
        channel: String,
        /// Update payload.
        body: UpdateBody,
    },
}

/// Domain-specific update payloads, discriminated by `entity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum UpdateBody {
    /// Update on an item channel.
    Item {
        /// Update kind (`childItem`).
        kind: UpdateKind,
        /// Operation performed.
        op: UpdateOp,
        /// Opaque domain value; passed through untouched.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    /// Update on a member channel.
    Member {
        /// Update kind (`sharedWith`).
        kind: UpdateKind,
        /// Operation performed.
        op: UpdateOp,
        /// Opaque domain value; passed through untouched.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    /// Update on a chat channel.
    Chat {
        /// Update kind (`itemChat`).
        kind: UpdateKind,
        /// Operation performed.
        op: UpdateOp,
        /// Opaque domain value; passed through untouched.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
}

/// What an update describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateKind {
    /// A child of the subscribed item changed.
    ChildItem,
    /// The set of resources shared with the member changed.
    SharedWith,
    /// A message was published on the item chat.
    ItemChat,
}

/// Operation carried by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOp {
    /// The entity was created.
    Create,
    /// The entity was deleted.
    Delete,
    /// The entity was published.
    Publish,
}
