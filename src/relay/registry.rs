//! Live connection registry: connection id -> outbound channel

use dashmap::DashMap;
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

use super::state::{Outbound, Recipient};

/// Handle to one connected socket's writer
#[derive(Clone)]
pub struct ConnectionHandle {
    pub tx: mpsc::UnboundedSender<ServerMsg>,
    pub connected_at: Instant,
}

/// Registry of all open connections
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection and get the receiving end of its outbound queue
    pub fn register(&self, conn_id: Uuid) -> mpsc::UnboundedReceiver<ServerMsg> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(
            conn_id,
            ConnectionHandle {
                tx,
                connected_at: Instant::now(),
            },
        );
        rx
    }

    pub fn unregister(&self, conn_id: &Uuid) -> Option<ConnectionHandle> {
        self.connections.remove(conn_id).map(|(_, h)| h)
    }

    /// Send to one connection. Returns false if it is gone.
    pub fn send(&self, conn_id: &Uuid, msg: ServerMsg) -> bool {
        self.connections
            .get(conn_id)
            .map(|c| c.tx.send(msg).is_ok())
            .unwrap_or(false)
    }

    /// Send to every connection except `except`; returns the number delivered
    pub fn broadcast(&self, msg: &ServerMsg, except: Option<&Uuid>) -> usize {
        self.connections
            .iter()
            .filter(|entry| Some(entry.key()) != except)
            .filter(|entry| entry.value().tx.send(msg.clone()).is_ok())
            .count()
    }

    /// Route an addressed message; undeliverable sends are dropped
    pub fn deliver(&self, outbound: Outbound) -> usize {
        match outbound.to {
            Recipient::Only(id) => usize::from(self.send(&id, outbound.msg)),
            Recipient::AllExcept(id) => self.broadcast(&outbound.msg, Some(&id)),
            Recipient::All => self.broadcast(&outbound.msg, None),
        }
    }

    pub fn contains(&self, conn_id: &Uuid) -> bool {
        self.connections.contains_key(conn_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_except_skips_sender() {
        let registry = ConnectionRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = registry.register(a);
        let mut rx_b = registry.register(b);

        let delivered = registry.deliver(Outbound {
            to: Recipient::AllExcept(a),
            msg: ServerMsg::PlayerDisconnected(a),
        });

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), ServerMsg::PlayerDisconnected(a));
    }

    #[test]
    fn closed_receivers_are_skipped() {
        let registry = ConnectionRegistry::new();
        let a = Uuid::new_v4();
        let rx = registry.register(a);
        drop(rx);

        assert!(!registry.send(&a, ServerMsg::PlayerDisconnected(a)));
        assert!(!registry.send(&Uuid::new_v4(), ServerMsg::PlayerDisconnected(a)));
    }

    #[test]
    fn unregister_removes() {
        let registry = ConnectionRegistry::new();
        let a = Uuid::new_v4();
        let _rx = registry.register(a);
        assert!(registry.contains(&a));
        assert!(registry.unregister(&a).is_some());
        assert!(registry.is_empty());
    }
}
