
use axum::Router;
use duet_core::{ChunkFormat, StorageLayout};
use duet_server::{AppState, ChunkStore, SignalingService, create_router};
use std::path::Path;
use std::sync::Arc;

use crate::integration::{TestCoordinator, create_test_coordinator};

pub const TEST_UPLOAD_LIMIT: usize = 1024 * 1024;

pub fn create_test_app(storage_root: &Path) -> (Router, TestCoordinator) {
    let harness = create_test_coordinator();
    let state = AppState {
        coordinator: harness.coordinator.clone(),
        signaling: SignalingService::new(),
        chunks: Arc::new(ChunkStore::new(
            StorageLayout::new(storage_root),
            ChunkFormat::default(),
        )),
    };
    (create_router(state, TEST_UPLOAD_LIMIT), harness)
}
