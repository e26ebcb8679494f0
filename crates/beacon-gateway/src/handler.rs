//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use beacon_realtime::connection::handle::{ConnectionHandle, Frame};

use crate::state::GatewayState;

/// GET /ws — WebSocket upgrade
pub async fn ws_handler(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: GatewayState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (outbound_tx, mut outbound_rx) = mpsc::channel(state.buffer_size);
    let handle = Arc::new(ConnectionHandle::new(outbound_tx));
    let conn_id = handle.id;

    // Pool first, then broker: the sweeper treats pooled-but-unregistered
    // connections as orphans, never the other way around.
    state.pool.add(handle.clone());
    state.broker.register(handle.clone());

    info!(conn_id = %conn_id, "WebSocket connection established");

    // Forward queued frames to the socket until termination.
    let cancel = handle.cancelled();
    let outbound_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
                frame = outbound_rx.recv() => {
                    let Some(frame) = frame else { break };
                    let message = match frame {
                        Frame::Text(text) => Message::Text(text.into()),
                        Frame::Ping => Message::Ping(Vec::new().into()),
                        Frame::Close => Message::Close(None),
                    };
                    let closing = matches!(message, Message::Close(_));
                    if ws_tx.send(message).await.is_err() || closing {
                        break;
                    }
                }
            }
        }
    });

    // Process inbound messages
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                crate::dispatcher::handle_frame(&state, &conn_id, text.as_str()).await;
            }
            Ok(Message::Pong(_)) => {
                state.broker.record_pong(&conn_id);
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Cleanup
    state.broker.remove(&conn_id);
    if let Some(handle) = state.pool.remove(&conn_id) {
        handle.terminate();
    }
    outbound_task.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
