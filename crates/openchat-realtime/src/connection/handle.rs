//! Individual WebSocket connection handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A write handle to a single WebSocket connection.
///
/// The handle owns the sending half of the connection's outbound queue;
/// the socket task drains the receiving half. Writes are fire-and-forget:
/// a full or closed queue drops the frame for this connection only.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// When the connection was established
    pub opened_at: DateTime<Utc>,
    /// Sender for serialized outbound frames
    sender: mpsc::Sender<String>,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a handle together with the receiver its socket task drains.
    pub fn open(buffer_size: usize) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let handle = Arc::new(Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            sender: tx,
            alive: AtomicBool::new(true),
        });
        (handle, rx)
    }

    /// Queue a serialized frame for this connection.
    ///
    /// Returns `false` when the frame was dropped (dead connection, full
    /// or closed queue). Never blocks.
    pub fn send(&self, text: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(conn_id = %self.id, "Send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if the connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
