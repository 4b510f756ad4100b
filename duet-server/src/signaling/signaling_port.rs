use async_trait::async_trait;
use duet_core::{ParticipantId, ServerMessage};

/// Outbound half of the signaling transport.
///
/// The coordinator only ever talks to connections through this trait, so
/// it can be driven in tests without sockets.
#[async_trait]
pub trait SignalingPort: Send + Sync {
    /// Delivers a message to one connection. Unknown connections are
    /// logged and skipped.
    async fn send(&self, to: &ParticipantId, message: ServerMessage);
}
