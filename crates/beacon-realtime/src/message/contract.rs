//! Serialize/parse boundary for wire messages.
//!
//! `parse_client` returns `None` for anything that is not a valid request:
//! bytes that are not JSON, an unknown `action` discriminator, a wrong
//! realm, or missing/mistyped fields. It never panics. Serialization fails
//! only when a message violates its own declared shape, which is a
//! programmer error; callers log it and drop the message.

use super::types::{ClientMessage, ServerMessage};

/// Serialize a server message to wire JSON.
pub fn serialize(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

/// Parse an inbound text frame into a client message.
pub fn parse_client(raw: &str) -> Option<ClientMessage> {
    serde_json::from_str(raw).ok()
}

/// Parse a server message (used by the bus relay and in tests).
pub fn parse_server(raw: &str) -> Option<ServerMessage> {
    serde_json::from_str(raw).ok()
}
