use duet_core::ServerMessage;
use duet_server::JoinOutcome;

use crate::integration::{create_test_coordinator, init_tracing, key, person};

#[tokio::test]
async fn test_first_joiner_awaits_peer() {
    init_tracing();

    let harness = create_test_coordinator();
    let alice = person("alice");

    let outcome = harness.coordinator.join(alice.clone(), &key("room-1")).await;

    assert!(matches!(outcome, JoinOutcome::Joined { peer: None, created: true, .. }));
    assert_eq!(
        harness.signaling.sent_to(&alice.id).await,
        vec![ServerMessage::AwaitingPeer {
            session: key("room-1")
        }]
    );
    assert_eq!(harness.signaling.total().await, 1);
}
