use async_trait::async_trait;
use duet_core::{ParticipantId, ServerMessage};
use duet_server::SignalingPort;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// A message the coordinator pushed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ParticipantId,
    pub message: ServerMessage,
}

/// Mock SignalingPort that captures all outgoing messages.
#[derive(Clone)]
pub struct MockSignaling {
    /// Channel to send captured deliveries.
    tx: mpsc::UnboundedSender<Delivery>,
    /// All captured deliveries (for verification).
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl MockSignaling {
    /// Create a new MockSignaling and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            deliveries: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Everything sent to one connection, in order.
    pub async fn sent_to(&self, id: &ParticipantId) -> Vec<ServerMessage> {
        self.deliveries
            .lock()
            .await
            .iter()
            .filter(|d| &d.to == id)
            .map(|d| d.message.clone())
            .collect()
    }

    /// How many `stop_recording` messages a connection received.
    pub async fn stops_for(&self, id: &ParticipantId) -> usize {
        self.sent_to(id)
            .await
            .iter()
            .filter(|m| matches!(m, ServerMessage::StopRecording))
            .count()
    }

    pub async fn total(&self) -> usize {
        self.deliveries.lock().await.len()
    }
}

#[async_trait]
impl SignalingPort for MockSignaling {
    async fn send(&self, to: &ParticipantId, message: ServerMessage) {
        tracing::debug!("[MockSignaling] send to {}: {:?}", to, message);

        let delivery = Delivery { to: *to, message };
        self.deliveries.lock().await.push(delivery.clone());
        let _ = self.tx.send(delivery);
    }
}
