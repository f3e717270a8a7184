//! The broadcast gateway: process-wide event delivery.
//!
//! Room-scoped fan-out lives in the room actors; the gateway covers
//! everything outside a room — per-connection unicasts (`entry`,
//! error notifications) and the global `update_public_rooms` broadcast.
//! Both paths feed the same per-connection outbound channel that the
//! connection handler pumps onto the socket.

use std::collections::HashMap;

use cinerate_protocol::{ConnId, ServerEvent};
use cinerate_room::Subscriber;
use tokio::sync::Mutex;

/// Routes server events to connected clients.
#[derive(Debug, Default)]
pub struct Gateway {
    senders: Mutex<HashMap<ConnId, Subscriber>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's outbound channel.
    pub async fn register(&self, conn: ConnId, sender: Subscriber) {
        self.senders.lock().await.insert(conn, sender);
    }

    /// Drops a connection's outbound channel.
    pub async fn unregister(&self, conn: ConnId) {
        self.senders.lock().await.remove(&conn);
    }

    /// Sends an event to a single connection. Silently drops if the
    /// connection is gone.
    pub async fn unicast(&self, conn: ConnId, event: ServerEvent) {
        if let Some(sender) = self.senders.lock().await.get(&conn) {
            let _ = sender.send(event);
        }
    }

    /// Sends an event to every connected client, in or out of rooms.
    pub async fn broadcast_all(&self, event: ServerEvent) {
        for sender in self.senders.lock().await.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.senders.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.senders.lock().await.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
