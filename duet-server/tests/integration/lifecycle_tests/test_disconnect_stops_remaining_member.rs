use duet_core::ServerMessage;

use crate::integration::{create_test_coordinator, init_tracing, key, person};

#[tokio::test]
async fn test_disconnect_stops_remaining_member() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let alice = person("alice");
    let bob = person("bob");
    harness.coordinator.join(alice.clone(), &key("room-1")).await;
    harness.coordinator.join(bob.clone(), &key("room-1")).await;

    let departure = harness.coordinator.disconnect(&alice.id).await.unwrap();

    assert_eq!(departure.key, key("room-1"));
    assert_eq!(departure.remaining, vec![bob.clone()]);
    assert!(!departure.closed);

    assert_eq!(harness.signaling.stops_for(&bob.id).await, 1);
    assert_eq!(harness.signaling.stops_for(&alice.id).await, 0);
    assert_eq!(
        harness.signaling.sent_to(&bob.id).await.last(),
        Some(&ServerMessage::StopRecording)
    );
    assert_eq!(harness.scheduled_merges(), vec![key("room-1")]);
    assert_eq!(harness.coordinator.registry().members(&key("room-1")), vec![bob]);
}

#[tokio::test]
async fn test_repeated_disconnect_has_no_further_effect() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let alice = person("alice");
    let bob = person("bob");
    harness.coordinator.join(alice.clone(), &key("room-1")).await;
    harness.coordinator.join(bob.clone(), &key("room-1")).await;

    assert!(harness.coordinator.leave(&alice.id).await.is_some());
    assert!(harness.coordinator.disconnect(&alice.id).await.is_none());
    assert!(harness.coordinator.leave(&alice.id).await.is_none());

    assert_eq!(harness.signaling.stops_for(&bob.id).await, 1);
    assert_eq!(harness.scheduled_merges().len(), 1);
}

#[tokio::test]
async fn test_last_member_leaving_closes_session() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let alice = person("alice");
    let bob = person("bob");
    harness.coordinator.join(alice.clone(), &key("room-1")).await;
    harness.coordinator.join(bob.clone(), &key("room-1")).await;

    harness.coordinator.disconnect(&alice.id).await;
    let departure = harness.coordinator.disconnect(&bob.id).await.unwrap();

    assert!(departure.closed);
    assert!(departure.remaining.is_empty());
    assert_eq!(harness.coordinator.registry().session_count(), 0);
    assert_eq!(harness.scheduled_merges(), vec![key("room-1"), key("room-1")]);
}

#[tokio::test]
async fn test_disconnect_without_session_schedules_nothing() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let loner = person("loner");

    assert!(harness.coordinator.disconnect(&loner.id).await.is_none());
    assert_eq!(harness.signaling.total().await, 0);
    assert!(harness.scheduled_merges().is_empty());
}
