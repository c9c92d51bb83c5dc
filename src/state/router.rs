use super::AppState;
use crate::protocol::{MessagePayload, ServerMessage};
use crate::types::ConnectionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Result of a targeted send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No participant with that display name
    RecipientNotFound,
    /// The connection is gone (or going)
    ChannelClosed,
}

/// Fan-out over the outbound queue of each live connection.
///
/// Broadcasts and unicasts share one queue per connection, so every client
/// sees events in the order they were sent.
#[derive(Clone, Default)]
pub struct Router {
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and outbound queue for a new connection
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = ulid::Ulid::new().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.write().await.insert(id.clone(), tx);
        (id, rx)
    }

    pub async fn disconnect(&self, connection_id: &str) -> bool {
        self.connections.write().await.remove(connection_id).is_some()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Queue `msg` for every connection; returns how many accepted it
    pub async fn broadcast(&self, msg: ServerMessage) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|tx| tx.send(msg.clone()).is_ok())
            .count()
    }

    pub async fn unicast(&self, connection_id: &str, msg: ServerMessage) -> Delivery {
        let connections = self.connections.read().await;
        let Some(tx) = connections.get(connection_id) else {
            return Delivery::ChannelClosed;
        };
        if tx.send(msg).is_ok() {
            Delivery::Delivered
        } else {
            Delivery::ChannelClosed
        }
    }
}

impl AppState {
    /// Deliver a private message to the participant named in `payload.recipient`
    pub async fn route_message(&self, payload: MessagePayload) -> Delivery {
        let target = self
            .directory
            .read()
            .await
            .find_by_name(&payload.recipient)
            .map(|p| p.connection_id.clone());

        let Some(connection_id) = target else {
            tracing::info!("Recipient {} not found, dropping message", payload.recipient);
            return Delivery::RecipientNotFound;
        };

        let recipient = payload.recipient.clone();
        let delivery = self
            .router
            .unicast(&connection_id, ServerMessage::ReceiveMessage(payload))
            .await;
        tracing::debug!(
            "Message for {} (connection {}): {:?}",
            recipient,
            connection_id,
            delivery
        );
        delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn payload(recipient: &str, text: &str) -> MessagePayload {
        let mut body = serde_json::Map::new();
        body.insert("text".to_string(), serde_json::Value::from(text));
        MessagePayload {
            recipient: recipient.to_string(),
            body,
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all() {
        let router = Router::new();
        let (_a, mut rx_a) = router.connect().await;
        let (_b, mut rx_b) = router.connect().await;

        assert_eq!(router.broadcast(ServerMessage::Kicked).await, 2);
        assert_eq!(rx_a.recv().await, Some(ServerMessage::Kicked));
        assert_eq!(rx_b.recv().await, Some(ServerMessage::Kicked));
    }

    #[tokio::test]
    async fn test_broadcast_skips_dropped_receivers() {
        let router = Router::new();
        let (_a, rx_a) = router.connect().await;
        let (_b, _rx_b) = router.connect().await;
        drop(rx_a);

        assert_eq!(router.broadcast(ServerMessage::Kicked).await, 1);
    }

    #[tokio::test]
    async fn test_unicast_outcomes() {
        let router = Router::new();
        let (a, mut rx_a) = router.connect().await;
        let (b, mut rx_b) = router.connect().await;

        assert_eq!(
            router.unicast(&a, ServerMessage::Kicked).await,
            Delivery::Delivered
        );
        assert_eq!(rx_a.recv().await, Some(ServerMessage::Kicked));
        assert!(rx_b.try_recv().is_err());

        router.disconnect(&b).await;
        assert_eq!(
            router.unicast(&b, ServerMessage::Kicked).await,
            Delivery::ChannelClosed
        );

        drop(rx_a);
        assert_eq!(
            router.unicast(&a, ServerMessage::Kicked).await,
            Delivery::ChannelClosed
        );
    }

    #[tokio::test]
    async fn test_route_message_to_named_recipient() {
        let state = AppState::default();
        let (bob, mut rx_bob) = state.router.connect().await;
        let (carol, mut rx_carol) = state.router.connect().await;
        state.register_user(&bob, "Bob", Role::Participant).await.unwrap();
        state.register_user(&carol, "Carol", Role::Participant).await.unwrap();
        while rx_bob.try_recv().is_ok() {}
        while rx_carol.try_recv().is_ok() {}

        let msg = payload("Bob", "hello");
        assert_eq!(state.route_message(msg.clone()).await, Delivery::Delivered);

        assert_eq!(rx_bob.recv().await, Some(ServerMessage::ReceiveMessage(msg)));
        assert!(rx_carol.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_route_message_to_padded_name() {
        let state = AppState::default();
        let (bob, mut rx_bob) = state.router.connect().await;
        state.register_user(&bob, "Bob ", Role::Participant).await.unwrap();
        while rx_bob.try_recv().is_ok() {}

        let msg = payload("Bob ", "hello");
        assert_eq!(state.route_message(msg.clone()).await, Delivery::Delivered);
        assert_eq!(rx_bob.recv().await, Some(ServerMessage::ReceiveMessage(msg)));
    }

    #[tokio::test]
    async fn test_route_message_unknown_recipient() {
        let state = AppState::default();
        let (_sender, mut rx) = state.router.connect().await;

        assert_eq!(
            state.route_message(payload("Nobody", "hi")).await,
            Delivery::RecipientNotFound
        );
        assert!(rx.try_recv().is_err());
    }
}
