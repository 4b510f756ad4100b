use duet_core::ServerMessage;
use duet_server::JoinOutcome;

use crate::integration::{create_test_coordinator, init_tracing, key, person};

#[tokio::test]
async fn test_third_peer_gets_room_full() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let alice = person("alice");
    let bob = person("bob");
    let carol = person("carol");

    harness.coordinator.join(alice.clone(), &key("room-1")).await;
    harness.coordinator.join(bob.clone(), &key("room-1")).await;
    let before_alice = harness.signaling.sent_to(&alice.id).await;
    let before_bob = harness.signaling.sent_to(&bob.id).await;

    let outcome = harness.coordinator.join(carol.clone(), &key("room-1")).await;

    assert!(matches!(outcome, JoinOutcome::Full { previous: None }));
    assert_eq!(
        harness.signaling.sent_to(&carol.id).await,
        vec![ServerMessage::RoomFull {
            session: key("room-1")
        }]
    );

    // Nobody inside the session hears about the rejected joiner.
    assert_eq!(harness.signaling.sent_to(&alice.id).await, before_alice);
    assert_eq!(harness.signaling.sent_to(&bob.id).await, before_bob);
    assert_eq!(
        harness.coordinator.registry().members(&key("room-1")),
        vec![alice, bob]
    );
    assert!(harness.scheduled_merges().is_empty());
}
