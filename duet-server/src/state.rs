use crate::coordinator::Coordinator;
use crate::signaling::SignalingService;
use crate::upload::ChunkStore;
use std::sync::Arc;

/// Shared state of the HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub signaling: SignalingService,
    pub chunks: Arc<ChunkStore>,
}
