use crate::session::Session;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use duet_core::{Participant, ParticipantId, SessionKey};
use std::sync::Arc;
use tracing::{info, warn};

/// A connection leaving a session, either on its own or because it joined
/// another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub key: SessionKey,
    pub remaining: Vec<Participant>,
    /// The session was removed because nobody is left.
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined {
        /// The member who was already waiting, if any.
        peer: Option<Participant>,
        created: bool,
        previous: Option<Departure>,
    },
    /// The connection was already a member of this session.
    AlreadyMember { peer: Option<Participant> },
    Full { previous: Option<Departure> },
}

/// Which session each connection belongs to.
///
/// Every mutation of a session's membership happens under that key's map
/// entry, so concurrent joins and leaves on one key cannot lose updates.
/// Session entries are always locked before membership entries.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionKey, Session>>,
    memberships: Arc<DashMap<ParticipantId, SessionKey>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, participant: Participant, key: &SessionKey) -> JoinOutcome {
        let id = participant.id;

        let previous = match self.session_of(&id) {
            Some(current) if &current == key => {
                let peer = self
                    .sessions
                    .get(key)
                    .and_then(|s| s.peer_of(&id).cloned());
                return JoinOutcome::AlreadyMember { peer };
            }
            Some(_) => {
                if self.sessions.get(key).is_some_and(|s| s.is_full()) {
                    // Keep the current membership when the target is
                    // visibly full.
                    return JoinOutcome::Full { previous: None };
                }
                self.leave(&id)
            }
            None => None,
        };

        match self.sessions.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                if session.is_full() {
                    warn!("Session '{}' is full, rejecting {}", key, id);
                    return JoinOutcome::Full { previous };
                }
                let peer = session.members.first().cloned();
                session.members.push(participant);
                self.memberships.insert(id, key.clone());
                info!("{} joined session '{}' ({} members)", id, key, session.members.len());
                JoinOutcome::Joined {
                    peer,
                    created: false,
                    previous,
                }
            }
            Entry::Vacant(entry) => {
                let mut session = Session::new(key.clone());
                session.members.push(participant);
                entry.insert(session);
                self.memberships.insert(id, key.clone());
                info!("{} created session '{}'", id, key);
                JoinOutcome::Joined {
                    peer: None,
                    created: true,
                    previous,
                }
            }
        }
    }

    /// Removes the connection from its session. Unknown connections are a
    /// no-op.
    pub fn leave(&self, id: &ParticipantId) -> Option<Departure> {
        let (_, key) = self.memberships.remove(id)?;

        let departure = match self.sessions.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().members.retain(|m| &m.id != id);
                let remaining = entry.get().members.clone();
                let closed = remaining.is_empty();
                if closed {
                    entry.remove();
                    info!("Session '{}' closed", key);
                }
                Departure {
                    key,
                    remaining,
                    closed,
                }
            }
            Entry::Vacant(_) => {
                warn!("Membership of {} pointed at missing session '{}'", id, key);
                Departure {
                    key,
                    remaining: Vec::new(),
                    closed: true,
                }
            }
        };

        info!("{} left session '{}'", id, departure.key);
        Some(departure)
    }

    /// Marks the session as ended and returns its members.
    pub fn end(&self, key: &SessionKey) -> Option<Vec<Participant>> {
        let mut session = self.sessions.get_mut(key)?;
        session.ended_at.get_or_insert_with(Utc::now);
        Some(session.members.clone())
    }

    pub fn session_of(&self, id: &ParticipantId) -> Option<SessionKey> {
        self.memberships.get(id).map(|k| k.value().clone())
    }

    pub fn members(&self, key: &SessionKey) -> Vec<Participant> {
        self.sessions
            .get(key)
            .map(|s| s.members.clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.get(key).map(|s| s.value().clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
