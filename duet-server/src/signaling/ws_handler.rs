use crate::state::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use duet_core::{ClientMessage, ParticipantId, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let participant_id = ParticipantId::new();
    info!("New WebSocket connection: {}", participant_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_peer(participant_id, tx);
    state
        .signaling
        .send_signal(&participant_id, &ServerMessage::Welcome { participant_id });

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => state.coordinator.handle(participant_id, client_msg).await,
                        Err(e) => {
                            warn!("Invalid ClientMessage from {}: {}", participant_id, e);
                            state.signaling.send_signal(
                                &participant_id,
                                &ServerMessage::Error {
                                    message: format!("invalid message: {e}"),
                                },
                            );
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Whichever half ended first, the participant is gone.
    state.coordinator.disconnect(&participant_id).await;
    state.signaling.remove_peer(&participant_id);
    info!("WebSocket disconnected: {}", participant_id);
}
