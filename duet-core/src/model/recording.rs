use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cadence at which a recording participant cuts and uploads a chunk.
pub const DEFAULT_CHUNK_INTERVAL: Duration = Duration::from_secs(5);

/// Container/codec of every chunk in a session.
///
/// Chunks are joined with a stream copy, so one format must hold for the
/// whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkFormat {
    #[default]
    WebmOpus,
}

impl ChunkFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChunkFormat::WebmOpus => "webm",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ChunkFormat::WebmOpus => "audio/webm;codecs=opus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Stopped,
}

/// Inputs to the per-participant recording lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingEvent {
    /// The media transport reported the peer connection as connected.
    PeerConnected,
    /// The local user pressed stop.
    LocalStop,
    /// The server broadcast `stop_recording` to the session.
    StopBroadcast,
}

/// What the media layer has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingAction {
    StartChunking {
        interval: Duration,
        format: ChunkFormat,
    },
    StopChunking,
}

/// `Idle -> Recording -> Stopped` for one participant.
#[derive(Debug, Clone)]
pub struct RecordingLifecycle {
    state: RecordingState,
    interval: Duration,
    format: ChunkFormat,
}

impl RecordingLifecycle {
    pub fn new(interval: Duration, format: ChunkFormat) -> Self {
        Self {
            state: RecordingState::Idle,
            interval,
            format,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn format(&self) -> ChunkFormat {
        self.format
    }

    /// Applies one event. Events that do not move the machine return `None`.
    pub fn handle(&mut self, event: RecordingEvent) -> Option<RecordingAction> {
        match (self.state, event) {
            (RecordingState::Idle, RecordingEvent::PeerConnected) => {
                self.state = RecordingState::Recording;
                Some(RecordingAction::StartChunking {
                    interval: self.interval,
                    format: self.format,
                })
            }
            (RecordingState::Recording, RecordingEvent::LocalStop | RecordingEvent::StopBroadcast) => {
                self.state = RecordingState::Stopped;
                Some(RecordingAction::StopChunking)
            }
            // Nothing is being recorded yet, and Stopped is terminal.
            _ => None,
        }
    }
}

impl Default for RecordingLifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_INTERVAL, ChunkFormat::default())
    }
}
