use duet_core::ServerMessage;

use crate::integration::{create_test_coordinator, init_tracing, key, person};

#[tokio::test]
async fn test_second_joiner_initiates() {
    init_tracing();

    let harness = create_test_coordinator();
    let alice = person("alice");
    let bob = person("bob");

    harness.coordinator.join(alice.clone(), &key("room-1")).await;
    harness.coordinator.join(bob.clone(), &key("room-1")).await;

    // The newcomer is told to start the negotiation toward the waiting member.
    assert_eq!(
        harness.signaling.sent_to(&bob.id).await,
        vec![ServerMessage::PeerAlreadyPresent {
            peer_id: alice.id,
            display_name: Some("alice".into()),
        }]
    );

    // The waiting member is told to expect it.
    assert_eq!(
        harness.signaling.sent_to(&alice.id).await,
        vec![
            ServerMessage::AwaitingPeer {
                session: key("room-1")
            },
            ServerMessage::NewPeerJoined {
                peer_id: bob.id,
                display_name: Some("bob".into()),
            },
        ]
    );
}

#[tokio::test]
async fn test_initiator_role_follows_join_order_across_sessions() {
    init_tracing();

    let harness = create_test_coordinator();

    for room in ["room-a", "room-b", "room-c"] {
        let first = person("first");
        let second = person("second");
        harness.coordinator.join(first.clone(), &key(room)).await;
        harness.coordinator.join(second.clone(), &key(room)).await;

        let to_second = harness.signaling.sent_to(&second.id).await;
        assert!(matches!(
            to_second.as_slice(),
            [ServerMessage::PeerAlreadyPresent { peer_id, .. }] if *peer_id == first.id
        ));
    }
}
