use axum::extract::ws::Message;
use duet_core::{ClientMessage, ServerMessage};
use duet_server::{Coordinator, MergeHandle, SessionRegistry, SignalingService};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::integration::{create_test_coordinator, init_tracing, key, payload, person};

fn text_frames(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<String> {
    let mut frames = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Message::Text(text) = msg {
            frames.push(text.as_str().to_owned());
        }
    }
    frames
}

#[tokio::test]
async fn test_payload_is_forwarded_unchanged() {
    init_tracing();

    let signaling = SignalingService::new();
    let (merge_tx, _merge_rx) = mpsc::unbounded_channel();
    let coordinator = Coordinator::new(
        SessionRegistry::new(),
        Arc::new(signaling.clone()),
        MergeHandle::new(merge_tx),
    );

    let alice = person("alice");
    let bob = person("bob");
    let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
    signaling.add_peer(alice.id, alice_tx);
    coordinator.join(alice.clone(), &key("room-1")).await;
    coordinator.join(bob.clone(), &key("room-1")).await;
    text_frames(&mut alice_rx);

    let payloads = [
        r#"{"type":"offer","sdp":"v=0\r\no=- 46117 2 IN IP4 127.0.0.1\r\n"}"#,
        r#"{"type":"offer","n":123456789012345678901234567890,"x":1e2,"z":-0.0}"#,
        r#"{"sdpMLineIndex":0,"candidate":"candidate:1 1 UDP 2122252543 192.168.1.2 54400 typ host"}"#,
        r#""just a string""#,
        r#"[1, 2,3, null,{"nested":[true,false]}]"#,
        "null",
        r#"{"unicode":"żółć 🎧","escaped":"\u00e9"}"#,
    ];

    for raw in payloads {
        let frame = format!(
            r#"{{"op":"signal","d":{{"to":"{}","payload":{}}}}}"#,
            alice.id, raw
        );
        let msg: ClientMessage = serde_json::from_str(&frame).unwrap();
        coordinator.handle(bob.id, msg).await;
    }

    let expected: Vec<String> = payloads
        .iter()
        .map(|raw| format!(r#"{{"op":"signal","d":{{"from":"{}","payload":{}}}}}"#, bob.id, raw))
        .collect();
    assert_eq!(text_frames(&mut alice_rx), expected);
}

#[tokio::test]
async fn test_sender_id_is_stamped_by_the_server() {
    init_tracing();

    let harness = create_test_coordinator();
    let alice = person("alice");
    let bob = person("bob");
    let mallory = person("mallory");
    harness.coordinator.join(alice.clone(), &key("room-1")).await;
    harness.coordinator.join(bob.clone(), &key("room-1")).await;

    harness
        .coordinator
        .handle(
            bob.id,
            ClientMessage::Signal {
                to: alice.id,
                from: Some(mallory.id),
                payload: payload(r#"{"type":"answer"}"#),
            },
        )
        .await;

    let last = harness.signaling.sent_to(&alice.id).await.pop().unwrap();
    assert_eq!(
        last,
        ServerMessage::Signal {
            from: bob.id,
            payload: payload(r#"{"type":"answer"}"#),
        }
    );
}
