mod chunk;
mod error;
mod participant;
mod recording;
mod session;
mod signaling;

pub use chunk::{
    ChunkName, MERGED_DIR, MIN_VALID_CHUNK_BYTES, MIX_FILE_NAME, StorageLayout, is_valid_chunk_size,
    participant_dir_name,
};
pub use error::CoreError;
pub use participant::{Participant, ParticipantId};
pub use recording::{
    ChunkFormat, DEFAULT_CHUNK_INTERVAL, RecordingAction, RecordingEvent, RecordingLifecycle,
    RecordingState,
};
pub use session::{SessionKey, is_safe_segment};
pub use signaling::{ClientMessage, ServerMessage, SignalEnvelope, SignalPayload};
