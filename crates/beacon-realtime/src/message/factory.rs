//! Constructors for common server messages.

use super::types::{
    ClientMessage, ErrorInfo, ErrorName, Realm, ResponseStatus, ServerMessage, UpdateBody,
};

/// Build a success response echoing the accepted request.
pub fn response_success(request: ClientMessage) -> ServerMessage {
    ServerMessage::Response {
        realm: Realm::Notif,
        status: ResponseStatus::Success,
        error: None,
        request: Some(request),
    }
}

/// Build an error response, echoing the offending request when available.
pub fn response_error(error: ErrorInfo, request: Option<ClientMessage>) -> ServerMessage {
    ServerMessage::Response {
        realm: Realm::Notif,
        status: ResponseStatus::Error,
        error: Some(error),
        request,
    }
}

/// Build an informational message.
pub fn info(message: impl Into<String>, extra: Option<serde_json::Value>) -> ServerMessage {
    ServerMessage::Info {
        realm: Realm::Notif,
        message: message.into(),
        extra,
    }
}

/// Build a channel update message.
pub fn update(channel: impl Into<String>, body: UpdateBody) -> ServerMessage {
    ServerMessage::Update {
        realm: Realm::Notif,
        channel: channel.into(),
        body,
    }
}

impl ErrorInfo {
    /// Error for a request that failed contract validation.
    pub fn invalid_request() -> Self {
        Self {
            name: ErrorName::InvalidRequest,
            message: "request does not follow the message contract".to_string(),
        }
    }

    /// Error for a rejected subscription.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self {
            name: ErrorName::AccessDenied,
            message: message.into(),
        }
    }

    /// Error for a missing channel or entity.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            name: ErrorName::NotFound,
            message: message.into(),
        }
    }

    /// Error for an unexpected server-side failure. The message stays
    /// generic; the real cause is logged server-side only.
    pub fn server_error() -> Self {
        Self {
            name: ErrorName::ServerError,
            message: "an unexpected error occurred".to_string(),
        }
    }
}
