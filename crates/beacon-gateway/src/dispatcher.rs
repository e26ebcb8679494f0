//! Inbound request dispatch.
//!
//! Every decoded request is answered with exactly one response message
//! that echoes the request for correlation. Client-facing failures are
//! recovered here and never propagate out of the dispatcher.

use tracing::{debug, error};

use beacon_core::error::{AppError, ErrorKind};
use beacon_realtime::connection::handle::{ConnectionId, Frame};
use beacon_realtime::message::contract;
use beacon_realtime::message::factory;
use beacon_realtime::message::types::{ClientMessage, EntityType, ErrorInfo, ServerMessage};

use crate::state::GatewayState;

/// Handles one inbound text frame from a connection.
pub async fn handle_frame(state: &GatewayState, conn_id: &ConnectionId, raw: &str) {
    let Some(request) = contract::parse_client(raw) else {
        debug!(conn_id = %conn_id, "frame failed message contract validation");
        respond(
            state,
            conn_id,
            factory::response_error(ErrorInfo::invalid_request(), None),
        );
        return;
    };

    match request.clone() {
        ClientMessage::Disconnect { .. } => {
            state.broker.remove(conn_id);
            if let Some(handle) = state.pool.remove(conn_id) {
                handle.terminate();
            }
        }
        ClientMessage::Subscribe {
            channel, entity, ..
        } => {
            handle_subscribe(state, conn_id, request, &channel, entity, false).await;
        }
        ClientMessage::SubscribeOnly {
            channel, entity, ..
        } => {
            handle_subscribe(state, conn_id, request, &channel, entity, true).await;
        }
        ClientMessage::Unsubscribe { channel, .. } => {
            let response = if state.broker.unsubscribe(conn_id, &channel) {
                factory::response_success(request)
            } else {
                factory::response_error(
                    ErrorInfo::not_found(format!("channel \"{channel}\" not found")),
                    Some(request),
                )
            };
            respond(state, conn_id, response);
        }
    }
}

async fn handle_subscribe(
    state: &GatewayState,
    conn_id: &ConnectionId,
    request: ClientMessage,
    channel: &str,
    entity: EntityType,
    exclusive: bool,
) {
    if let Err(e) = state.access.authorize_subscribe(channel, entity).await {
        respond(
            state,
            conn_id,
            factory::response_error(wire_error(&e), Some(request)),
        );
        return;
    }

    // channels come into existence with the first authorized subscriber and
    // are garbage-collected once the last one leaves
    if !state.broker.channel_exists(channel) {
        state.broker.create_channel(channel, true);
    }

    let subscribed = if exclusive {
        state.broker.subscribe_only(conn_id, channel)
    } else {
        state.broker.subscribe(conn_id, channel)
    };

    let response = if subscribed {
        factory::response_success(request)
    } else {
        factory::response_error(
            ErrorInfo::not_found(format!("channel \"{channel}\" not found")),
            Some(request),
        )
    };
    respond(state, conn_id, response);
}

/// Maps an authorization failure to its wire error. Unexpected kinds are
/// logged in full and surfaced with a generic message only.
fn wire_error(error: &AppError) -> ErrorInfo {
    match error.kind {
        ErrorKind::AccessDenied => ErrorInfo::access_denied(error.message.clone()),
        ErrorKind::NotFound => ErrorInfo::not_found(error.message.clone()),
        _ => {
            error!(error = %error, "collaborator failure while servicing request");
            ErrorInfo::server_error()
        }
    }
}

fn respond(state: &GatewayState, conn_id: &ConnectionId, message: ServerMessage) {
    let payload = match contract::serialize(&message) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            return;
        }
    };
    if let Some(handle) = state.pool.get(conn_id) {
        handle.send(Frame::Text(payload));
    }
}
