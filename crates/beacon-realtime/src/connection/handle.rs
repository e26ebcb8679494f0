//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Outbound frame pushed to the transport writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A serialized text message.
    Text(String),
    /// A liveness probe; the transport answers with a pong.
    Ping,
    /// Orderly close of the connection.
    Close,
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender half of the outbound frame channel plus a cancellation
/// token the transport loop watches; cancelling it force-closes the socket.
/// The broker only ever talks to connections through this handle, never to
/// the socket itself.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound frames
    sender: mpsc::Sender<Frame>,
    /// Whether the connection is still open for writes
    open: AtomicBool,
    /// Cancelled to force-close the underlying socket
    cancel: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle around an outbound frame sender.
    pub fn new(sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            open: AtomicBool::new(true),
            cancel: CancellationToken::new(),
        }
    }

    /// Push an outbound frame to this connection.
    ///
    /// Never blocks. Returns `false` if the connection is not open, its
    /// buffer is full, or the transport loop has gone away.
    pub fn send(&self, frame: Frame) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Check if the connection is open for writes.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Mark the connection as closed; further sends are skipped.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Forcibly close the connection: stop accepting writes and signal the
    /// transport loop to drop the socket.
    pub fn terminate(&self) {
        self.mark_closed();
        self.cancel.cancel();
    }

    /// Token the transport loop selects on to observe termination.
    pub fn cancelled(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
