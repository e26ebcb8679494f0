//! Wire message contract.
//!
//! Defines the exact shape of every message crossing the wire (client to
//! server, server to client, instance to bus) and the serialize/parse
//! boundary that enforces it.

pub mod contract;
pub mod factory;
pub mod types;

pub use types::{ClientMessage, EntityType, ErrorInfo, ErrorName, ServerMessage, UpdateBody};
