use chrono::{DateTime, Utc};
use duet_core::{Participant, ParticipantId, SessionKey};

/// A call holds at most this many participants.
pub const SESSION_CAPACITY: usize = 2;

#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    /// Join order; the first entry is the member who waited.
    pub members: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub(crate) fn new(key: SessionKey) -> Self {
        Self {
            key,
            members: Vec::with_capacity(SESSION_CAPACITY),
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= SESSION_CAPACITY
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }

    pub fn peer_of(&self, id: &ParticipantId) -> Option<&Participant> {
        self.members.iter().find(|m| &m.id != id)
    }
}
