use std::collections::HashMap;

use system::{ConnectionId, SessionEvent};

use crate::connection::ConnectionEvent;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

/// Fan-out side of the server: one sender per live connection. A failed
/// send means the receiving half is gone, so the entry is pruned on the
/// spot; there is no delivery guarantee beyond the transport's.
pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    pub async fn send(&mut self, to: &ConnectionId, message: ConnectionEvent) {
        if let Some(tx) = self.connection_txs.get_mut(to) {
            if tx.send(message).await.is_err() {
                log::warn!("Dropping closed connection {}", to);
                self.connection_txs.remove(to);
            }
        } else {
            log::warn!("No such connection: {}", to);
        }
    }

    /// Delivery mode for cursor/chat/rename: every live connection,
    /// including the sender.
    pub async fn broadcast(&mut self, event: SessionEvent) {
        let mut closed = Vec::new();
        for (connection_id, tx) in self.connection_txs.iter_mut() {
            if tx
                .send(ConnectionEvent::SessionEvent(event.clone()))
                .await
                .is_err()
            {
                closed.push(*connection_id);
            }
        }
        self.prune(closed);
    }

    /// Delivery mode for join/leave notices: everyone but the sender, who
    /// learns of its own lifecycle another way.
    pub async fn broadcast_except(&mut self, except: &ConnectionId, event: SessionEvent) {
        let mut closed = Vec::new();
        for (connection_id, tx) in self.connection_txs.iter_mut() {
            if connection_id == except {
                continue;
            }
            if tx
                .send(ConnectionEvent::SessionEvent(event.clone()))
                .await
                .is_err()
            {
                closed.push(*connection_id);
            }
        }
        self.prune(closed);
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }

    fn prune(&mut self, closed: Vec<ConnectionId>) {
        for connection_id in closed {
            log::warn!("Dropping closed connection {}", connection_id);
            self.connection_txs.remove(&connection_id);
        }
    }

    #[cfg(test)]
    fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connection_txs.contains_key(connection_id)
    }
}
