pub mod http_tests;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use duet_core::{Participant, ParticipantId, SessionKey, SignalPayload};
use duet_server::{Coordinator, MergeCommand, MergeHandle, SessionRegistry};

use crate::utils::MockSignaling;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub struct TestCoordinator {
    pub coordinator: Coordinator,
    pub signaling: MockSignaling,
    merge_rx: mpsc::UnboundedReceiver<MergeCommand>,
}

impl TestCoordinator {
    /// Merge requests queued so far, oldest first.
    pub fn scheduled_merges(&mut self) -> Vec<SessionKey> {
        let mut keys = Vec::new();
        while let Ok(MergeCommand::Schedule(key)) = self.merge_rx.try_recv() {
            keys.push(key);
        }
        keys
    }
}

pub fn create_test_coordinator() -> TestCoordinator {
    let (signaling, _rx) = MockSignaling::new();
    let (merge_tx, merge_rx) = mpsc::unbounded_channel();

    let coordinator = Coordinator::new(
        SessionRegistry::new(),
        Arc::new(signaling.clone()),
        MergeHandle::new(merge_tx),
    );

    TestCoordinator {
        coordinator,
        signaling,
        merge_rx,
    }
}

pub fn key(raw: &str) -> SessionKey {
    SessionKey::parse(raw).expect("valid session key")
}

pub fn person(name: &str) -> Participant {
    Participant::new(ParticipantId::new(), Some(name.to_owned()))
}

pub fn payload(json: &str) -> SignalPayload {
    SignalPayload::from_json(json).expect("valid payload json")
}
