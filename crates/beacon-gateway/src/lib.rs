//! # beacon-gateway
//!
//! Connection-acceptance layer for Beacon. Upgrades WebSocket requests,
//! registers connections with the channel broker, decodes inbound frames
//! against the message contract, and answers every request with a response
//! message. Authorization is delegated through the [`AccessValidator`]
//! seam; the broker itself never authorizes.

pub mod access;
pub mod dispatcher;
pub mod handler;
pub mod state;

use axum::routing::get;
use axum::Router;

pub use access::{AccessValidator, AllowAll};
pub use state::GatewayState;

/// Builds the gateway router. `GET /ws` upgrades to a WebSocket.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/ws", get(handler::ws_handler))
        .with_state(state)
}
