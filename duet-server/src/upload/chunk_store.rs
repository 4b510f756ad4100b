use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use duet_core::{ChunkFormat, ChunkName, CoreError, SessionKey, StorageLayout};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::time::Instant;
use tracing::{debug, info};

/// Sequence counters unused for this long are dropped and re-seeded from
/// disk on the next upload.
pub const DEFAULT_SEQUENCE_IDLE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidName(#[from] CoreError),

    #[error("failed to write chunk to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One chunk as written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChunk {
    pub path: PathBuf,
    pub file_name: String,
    pub sequence: u64,
    pub bytes: usize,
}

struct SequenceSlot {
    next: u64,
    /// Issued numbers whose file is not renamed into place yet.
    in_flight: usize,
    last_used: Instant,
}

/// Writes uploaded chunks and issues their sequence numbers.
///
/// Sequence numbers are per participant directory and continue from the
/// highest one already on disk, so a restarted server keeps the order.
/// Counters of directories that stay idle are dropped; a counter is never
/// dropped while one of its chunks is still being written.
pub struct ChunkStore {
    layout: StorageLayout,
    format: ChunkFormat,
    idle_ttl: Duration,
    sequences: DashMap<PathBuf, SequenceSlot>,
}

impl ChunkStore {
    pub fn new(layout: StorageLayout, format: ChunkFormat) -> Self {
        Self {
            layout,
            format,
            idle_ttl: DEFAULT_SEQUENCE_IDLE_TTL,
            sequences: DashMap::new(),
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Number of directories with a live sequence counter.
    pub fn tracked_dirs(&self) -> usize {
        self.sequences.len()
    }

    pub async fn store(
        &self,
        key: &SessionKey,
        participant_dir: &str,
        data: Bytes,
    ) -> Result<StoredChunk, StoreError> {
        self.evict_idle();

        let dir = self.layout.participant_dir(key, participant_dir);
        fs::create_dir_all(&dir).await.map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let sequence = self.issue(&dir).await?;
        let result = self.write(&dir, sequence, &data).await;
        if let Some(mut slot) = self.sequences.get_mut(&dir) {
            slot.in_flight = slot.in_flight.saturating_sub(1);
            slot.last_used = Instant::now();
        }
        let (path, file_name) = result?;

        info!(
            "Stored chunk #{} for '{}'/'{}' ({} bytes) at {}",
            sequence,
            key,
            participant_dir,
            data.len(),
            path.display()
        );

        Ok(StoredChunk {
            path,
            file_name,
            sequence,
            bytes: data.len(),
        })
    }

    /// Drops counters idle for longer than the TTL with nothing in flight.
    pub fn evict_idle(&self) {
        let ttl = self.idle_ttl;
        let before = self.sequences.len();
        self.sequences
            .retain(|_, slot| slot.in_flight > 0 || slot.last_used.elapsed() < ttl);

        let evicted = before.saturating_sub(self.sequences.len());
        if evicted > 0 {
            debug!("Dropped {} idle sequence counter(s)", evicted);
        }
    }

    async fn write(&self, dir: &Path, sequence: u64, data: &Bytes) -> Result<(PathBuf, String), StoreError> {
        let name = ChunkName::new(sequence, Utc::now().timestamp_millis().max(0) as u64, self.format);
        let file_name = name.file_name();
        let path = dir.join(&file_name);

        // Written under a name the merge job ignores, then renamed, so a
        // merge never sees a half-written chunk.
        let partial = dir.join(format!(".{file_name}.part"));
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        fs::write(&partial, data).await.map_err(io_err)?;
        fs::rename(&partial, &path).await.map_err(io_err)?;
        Ok((path, file_name))
    }

    async fn issue(&self, dir: &Path) -> Result<u64, StoreError> {
        loop {
            if let Some(mut slot) = self.sequences.get_mut(dir) {
                let sequence = slot.next;
                slot.next += 1;
                slot.in_flight += 1;
                slot.last_used = Instant::now();
                return Ok(sequence);
            }

            let seed = next_sequence_on_disk(dir).await.map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            debug!("Sequence for {} starts at {}", dir.display(), seed);
            self.sequences
                .entry(dir.to_path_buf())
                .or_insert_with(|| SequenceSlot {
                    next: seed,
                    in_flight: 0,
                    last_used: Instant::now(),
                });
        }
    }
}

async fn next_sequence_on_disk(dir: &Path) -> io::Result<u64> {
    let mut entries = fs::read_dir(dir).await?;
    let mut next = 0;

    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str().and_then(ChunkName::parse) {
            next = next.max(name.sequence.saturating_add(1));
        }
    }
    Ok(next)
}
