use crate::signaling::SignalingPort;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use duet_core::{ParticipantId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
}

/// Outbound WebSocket queues of every live connection.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, peer_id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer_id, tx);
    }

    pub fn remove_peer(&self, peer_id: &ParticipantId) {
        self.inner.peers.remove(peer_id);
    }

    pub fn is_connected(&self, peer_id: &ParticipantId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    pub fn send_signal(&self, peer_id: &ParticipantId, msg: &ServerMessage) {
        if let Some(peer) = self.inner.peers.get(peer_id) {
            match serde_json::to_string(msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {}: {:?}", peer_id, e);
                    }
                }
                Err(e) => error!("Failed to serialize server message: {}", e),
            }
        } else {
            warn!("Attempted to send signal to disconnected participant {}", peer_id);
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingPort for SignalingService {
    async fn send(&self, to: &ParticipantId, message: ServerMessage) {
        self.send_signal(to, &message);
    }
}
