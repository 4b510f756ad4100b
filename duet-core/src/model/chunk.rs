//! On-disk contract between the upload endpoint and the merge job.
//!
//! ```text
//! <root>/<session>/<participant>/chunk-<sequence>-<timestamp_ms>.webm
//! <root>/<session>/merged/full-<participant>.webm
//! <root>/<session>/merged/final-meeting.mp3
//! ```

use crate::model::error::CoreError;
use crate::model::recording::ChunkFormat;
use crate::model::session::{SessionKey, is_safe_segment};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Chunks at or below this size carry no usable audio.
pub const MIN_VALID_CHUNK_BYTES: u64 = 8000;

/// Reserved per-session directory holding merge outputs.
pub const MERGED_DIR: &str = "merged";

pub const MIX_FILE_NAME: &str = "final-meeting.mp3";

const CHUNK_PREFIX: &str = "chunk-";
const LEGACY_PREFIX: &str = "audio-";

pub fn is_valid_chunk_size(len: u64) -> bool {
    len > MIN_VALID_CHUNK_BYTES
}

/// Name of one uploaded chunk.
///
/// `sequence` is issued by the upload layer per participant and is the
/// primary ordering key; the timestamp only breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkName {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub format: ChunkFormat,
}

impl ChunkName {
    pub fn new(sequence: u64, timestamp_ms: u64, format: ChunkFormat) -> Self {
        Self {
            sequence,
            timestamp_ms,
            format,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{CHUNK_PREFIX}{:08}-{}.{}",
            self.sequence,
            self.timestamp_ms,
            self.format.extension()
        )
    }

    /// Parses both `chunk-<seq>-<ts>.webm` and the older `audio-<ts>.webm`
    /// names. The older ones have no sequence, so the timestamp stands in.
    pub fn parse(file_name: &str) -> Option<Self> {
        let format = ChunkFormat::WebmOpus;
        let stem = file_name.strip_suffix(&format!(".{}", format.extension()))?;

        if let Some(rest) = stem.strip_prefix(CHUNK_PREFIX) {
            let (seq, ts) = rest.split_once('-')?;
            return Some(Self::new(parse_digits(seq)?, parse_digits(ts)?, format));
        }

        let ts = parse_digits(stem.strip_prefix(LEGACY_PREFIX)?)?;
        Some(Self::new(ts, ts, format))
    }
}

fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl Ord for ChunkName {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.sequence, self.timestamp_ms).cmp(&(other.sequence, other.timestamp_ms))
    }
}

impl PartialOrd for ChunkName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Directory name a participant's chunks are stored under.
///
/// The display name wins when it is a usable directory name so a person
/// who reconnects keeps appending to the same track; otherwise the
/// participant id is used.
pub fn participant_dir_name(
    display_name: Option<&str>,
    participant_id: &str,
) -> Result<String, CoreError> {
    let usable = |name: &str| is_safe_segment(name) && name != MERGED_DIR;

    match display_name.map(str::trim) {
        Some(name) if usable(name) => Ok(name.to_owned()),
        _ if usable(participant_id) => Ok(participant_id.to_owned()),
        _ => Err(CoreError::InvalidStorageName(participant_id.to_owned())),
    }
}

/// Resolves paths under one storage root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, key: &SessionKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    pub fn participant_dir(&self, key: &SessionKey, participant_dir: &str) -> PathBuf {
        self.session_dir(key).join(participant_dir)
    }

    pub fn merged_dir(&self, key: &SessionKey) -> PathBuf {
        self.session_dir(key).join(MERGED_DIR)
    }

    pub fn track_path(&self, key: &SessionKey, participant_dir: &str, format: ChunkFormat) -> PathBuf {
        self.merged_dir(key)
            .join(format!("full-{participant_dir}.{}", format.extension()))
    }

    pub fn concat_list_path(&self, key: &SessionKey, participant_dir: &str) -> PathBuf {
        self.merged_dir(key).join(format!("{participant_dir}.concat.txt"))
    }

    pub fn mix_path(&self, key: &SessionKey) -> PathBuf {
        self.merged_dir(key).join(MIX_FILE_NAME)
    }
}
