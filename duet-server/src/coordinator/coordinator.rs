use crate::merge::MergeHandle;
use crate::session::{Departure, JoinOutcome, SessionRegistry};
use crate::signaling::SignalingPort;
use duet_core::{ClientMessage, Participant, ParticipantId, ServerMessage, SessionKey, SignalEnvelope};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a signal envelope was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    SenderNotInSession,
    RecipientNotFound,
    DifferentSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    Dropped(DropReason),
}

struct CoordinatorInner {
    registry: SessionRegistry,
    signaling: Arc<dyn SignalingPort>,
    merges: MergeHandle,
}

/// Turns connection events into session membership changes, pairing
/// instructions, relayed signals, stop broadcasts and merge requests.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

impl Coordinator {
    pub fn new(registry: SessionRegistry, signaling: Arc<dyn SignalingPort>, merges: MergeHandle) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                registry,
                signaling,
                merges,
            }),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    /// Dispatches one frame received from `sender`.
    pub async fn handle(&self, sender: ParticipantId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join {
                session,
                display_name,
            } => {
                self.join(Participant::new(sender, display_name), &session).await;
            }
            ClientMessage::Signal { to, from, payload } => {
                if from.is_some_and(|claimed| claimed != sender) {
                    debug!("{} claimed to be {:?}, using the connection id", sender, from);
                }
                self.relay(SignalEnvelope {
                    from: sender,
                    to,
                    payload,
                })
                .await;
            }
            ClientMessage::EndSession { session } => {
                self.end_session(sender, &session).await;
            }
            ClientMessage::Leave => {
                self.leave(&sender).await;
            }
        }
    }

    /// Adds the participant to `key` and tells both sides who initiates.
    ///
    /// The newcomer always initiates toward the member who was waiting.
    pub async fn join(&self, participant: Participant, key: &SessionKey) -> JoinOutcome {
        let id = participant.id;
        let display_name = participant.display_name.clone();
        let outcome = self.inner.registry.join(participant, key);

        match &outcome {
            JoinOutcome::Joined { peer, previous, .. } => {
                if let Some(departure) = previous {
                    self.on_departure(&id, departure).await;
                }
                match peer {
                    Some(existing) => {
                        info!("Pairing {} (initiator) with {} in '{}'", id, existing.id, key);
                        self.send(
                            &id,
                            ServerMessage::PeerAlreadyPresent {
                                peer_id: existing.id,
                                display_name: existing.display_name.clone(),
                            },
                        )
                        .await;
                        self.send(
                            &existing.id,
                            ServerMessage::NewPeerJoined {
                                peer_id: id,
                                display_name,
                            },
                        )
                        .await;
                    }
                    None => {
                        self.send(&id, ServerMessage::AwaitingPeer { session: key.clone() })
                            .await;
                    }
                }
            }
            // A repeated join restarts the negotiation, so both sides get
            // the same roles as on the first pairing.
            JoinOutcome::AlreadyMember { peer } => match peer {
                Some(existing) => {
                    info!("{} rejoined '{}', re-pairing with {}", id, key, existing.id);
                    self.send(
                        &id,
                        ServerMessage::PeerAlreadyPresent {
                            peer_id: existing.id,
                            display_name: existing.display_name.clone(),
                        },
                    )
                    .await;
                    self.send(
                        &existing.id,
                        ServerMessage::NewPeerJoined {
                            peer_id: id,
                            display_name,
                        },
                    )
                    .await;
                }
                None => {
                    self.send(&id, ServerMessage::AwaitingPeer { session: key.clone() })
                        .await;
                }
            },
            JoinOutcome::Full { previous } => {
                if let Some(departure) = previous {
                    self.on_departure(&id, departure).await;
                }
                self.send(&id, ServerMessage::RoomFull { session: key.clone() })
                    .await;
            }
        }

        outcome
    }

    /// Forwards an opaque payload to the other participant of the sender's
    /// session. Misses are logged and dropped.
    pub async fn relay(&self, envelope: SignalEnvelope) -> RelayOutcome {
        let registry = &self.inner.registry;

        let outcome = match (registry.session_of(&envelope.from), registry.session_of(&envelope.to)) {
            (None, _) => RelayOutcome::Dropped(DropReason::SenderNotInSession),
            (_, None) => RelayOutcome::Dropped(DropReason::RecipientNotFound),
            (Some(a), Some(b)) if a != b => RelayOutcome::Dropped(DropReason::DifferentSession),
            _ => RelayOutcome::Delivered,
        };

        match outcome {
            RelayOutcome::Delivered => {
                debug!("Signal relayed from {} to {}", envelope.from, envelope.to);
                self.send(
                    &envelope.to,
                    ServerMessage::Signal {
                        from: envelope.from,
                        payload: envelope.payload,
                    },
                )
                .await;
            }
            RelayOutcome::Dropped(reason) => {
                warn!(
                    "Dropping signal from {} to {}: {:?}",
                    envelope.from, envelope.to, reason
                );
            }
        }

        outcome
    }

    /// Explicit leave; same effects as a dropped connection.
    pub async fn leave(&self, id: &ParticipantId) -> Option<Departure> {
        let departure = self.inner.registry.leave(id)?;
        self.on_departure(id, &departure).await;
        Some(departure)
    }

    /// Socket closed. Stops the remaining member's recording and queues the
    /// session's merge.
    pub async fn disconnect(&self, id: &ParticipantId) -> Option<Departure> {
        info!("Participant {} disconnected", id);
        self.leave(id).await
    }

    /// Manual stop: every member is told to stop recording. Only members of
    /// the session may end it.
    pub async fn end_session(&self, sender: ParticipantId, key: &SessionKey) -> bool {
        if self.inner.registry.session_of(&sender).as_ref() != Some(key) {
            warn!("{} tried to end session '{}' it is not part of", sender, key);
            return false;
        }
        let Some(members) = self.inner.registry.end(key) else {
            return false;
        };

        info!("Ending session '{}' on request of {}", key, sender);
        for member in &members {
            self.send(&member.id, ServerMessage::StopRecording).await;
        }
        true
    }

    /// A participant's last chunk is stored. Requests the merge again so a
    /// slow final upload lands in a merge pass.
    pub fn uploads_complete(&self, key: &SessionKey) {
        info!("Final chunk received for '{}'", key);
        self.inner.merges.schedule(key.clone());
    }

    async fn on_departure(&self, id: &ParticipantId, departure: &Departure) {
        for member in &departure.remaining {
            info!("Stopping recording of {} after {} left '{}'", member.id, id, departure.key);
            self.send(&member.id, ServerMessage::StopRecording).await;
        }
        self.inner.merges.schedule(departure.key.clone());
    }

    async fn send(&self, to: &ParticipantId, msg: ServerMessage) {
        self.inner.signaling.send(to, msg).await;
    }
}
