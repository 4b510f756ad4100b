use crate::model::participant::ParticipantId;
use crate::model::session::SessionKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

/// Frames a client sends over the signaling socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        session: SessionKey,
        #[serde(default)]
        display_name: Option<String>,
    },
    /// Negotiation payload for the other participant. `from` is informational
    /// only; the server stamps the sending connection's id.
    Signal {
        to: ParticipantId,
        #[serde(default)]
        from: Option<ParticipantId>,
        payload: SignalPayload,
    },
    EndSession {
        session: SessionKey,
    },
    Leave,
}

/// Frames the server pushes to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        participant_id: ParticipantId,
    },
    /// First member of the session; nothing to do until a peer arrives.
    AwaitingPeer {
        session: SessionKey,
    },
    /// Sent to the newcomer: the other side is already here, start the
    /// negotiation toward it.
    PeerAlreadyPresent {
        peer_id: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    /// Sent to the existing member: expect an incoming negotiation.
    NewPeerJoined {
        peer_id: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    RoomFull {
        session: SessionKey,
    },
    Signal {
        from: ParticipantId,
        payload: SignalPayload,
    },
    StopRecording,
    Error {
        message: String,
    },
}

/// A negotiation payload in flight between two connections.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEnvelope {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub payload: SignalPayload,
}

/// Negotiation payload held as the exact JSON text the sender wrote.
///
/// It is never parsed into a tree, so key order and number literals reach
/// the recipient byte for byte. The frame's `op` has to precede its `d` for
/// the text to be captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalPayload(Box<RawValue>);

impl SignalPayload {
    pub fn from_json(json: impl Into<String>) -> Result<Self, serde_json::Error> {
        RawValue::from_string(json.into()).map(Self)
    }

    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::value::to_raw_value(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(self.as_str())
    }
}

impl PartialEq for SignalPayload {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for SignalPayload {}
