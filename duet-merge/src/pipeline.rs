use crate::media::{MediaError, MediaTool, concat_list};
use duet_core::{ChunkFormat, ChunkName, MERGED_DIR, MIN_VALID_CHUNK_BYTES, SessionKey, StorageLayout};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to prepare {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("final mix failed: {0}")]
    Mix(#[source] MediaError),
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub storage_root: PathBuf,
    /// Chunks of this size or smaller are left out.
    pub min_chunk_bytes: u64,
    pub format: ChunkFormat,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("uploads"),
            min_chunk_bytes: MIN_VALID_CHUNK_BYTES,
            format: ChunkFormat::default(),
        }
    }
}

/// One participant's concatenated recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub participant: String,
    pub path: PathBuf,
    pub chunks: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoValidChunks,
    Unreadable(String),
    ConcatFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub participant: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub session: SessionKey,
    pub tracks: Vec<Track>,
    pub skipped: Vec<Skipped>,
    /// Path of the mix, when there were at least two tracks.
    pub mix: Option<PathBuf>,
}

struct ValidChunk {
    name: ChunkName,
    path: PathBuf,
    len: u64,
}

/// Turns one session's chunk directories into per-participant tracks and,
/// with two or more tracks, one mixed file.
///
/// Inputs are never modified. Outputs of an earlier run are removed before
/// they are rebuilt, so the files on disk always match the latest report.
pub struct MergePipeline<M> {
    options: MergeOptions,
    media: M,
}

impl<M: MediaTool> MergePipeline<M> {
    pub fn new(options: MergeOptions, media: M) -> Self {
        Self { options, media }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub async fn run(&self, key: &SessionKey) -> Result<MergeReport, MergeError> {
        let layout = self.prepare(key).await?;
        let mix = layout.mix_path(key);
        remove_stale(&mix)
            .await
            .map_err(|source| MergeError::Setup {
                path: mix.clone(),
                source,
            })?;
        let session_dir = layout.session_dir(key);
        info!("Starting merge of session '{}' in {}", key, session_dir.display());

        let participants = self.participants(&session_dir).await?;
        info!(
            "Found {} participant directories: {}",
            participants.len(),
            participants.join(", ")
        );

        let mut report = MergeReport {
            session: key.clone(),
            tracks: Vec::new(),
            skipped: Vec::new(),
            mix: None,
        };

        for participant in participants {
            match self.build_track(&layout, key, &participant).await {
                Ok(track) => report.tracks.push(track),
                Err(reason) => {
                    warn!("Skipping '{}': {:?}", participant, reason);
                    report.skipped.push(Skipped { participant, reason });
                }
            }
        }

        if report.tracks.len() < 2 {
            warn!(
                "Need at least two tracks to mix, have {}; skipping final mix",
                report.tracks.len()
            );
            return Ok(report);
        }

        let inputs: Vec<PathBuf> = report.tracks.iter().map(|t| t.path.clone()).collect();
        info!("Mixing {} tracks into {}", inputs.len(), mix.display());
        self.media.mix(&inputs, &mix).await.map_err(|e| {
            error!("Final mix of '{}' failed: {}", key, e);
            MergeError::Mix(e)
        })?;

        info!("Final mix created: {}", mix.display());
        report.mix = Some(mix);
        Ok(report)
    }

    /// Creates the root, session and output directories and anchors the
    /// layout at the absolute root, since concat lists resolve relative
    /// paths against their own location.
    async fn prepare(&self, key: &SessionKey) -> Result<StorageLayout, MergeError> {
        let root = &self.options.storage_root;
        let merged = StorageLayout::new(root).merged_dir(key);
        fs::create_dir_all(&merged)
            .await
            .map_err(|source| MergeError::Setup { path: merged, source })?;

        let absolute = fs::canonicalize(root)
            .await
            .map_err(|source| MergeError::Setup {
                path: root.clone(),
                source,
            })?;
        Ok(StorageLayout::new(absolute))
    }

    /// Participant directory names, sorted. The output directory, plain
    /// files and entries that cannot be inspected are left out.
    async fn participants(&self, session_dir: &Path) -> Result<Vec<String>, MergeError> {
        let setup = |source| MergeError::Setup {
            path: session_dir.to_path_buf(),
            source,
        };
        let mut entries = fs::read_dir(session_dir).await.map_err(setup)?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(setup)? {
            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };
            if name == MERGED_DIR {
                continue;
            }
            match entry.file_type().await {
                Ok(kind) if kind.is_dir() => names.push(name),
                Ok(_) => {}
                Err(e) => warn!("Could not stat '{}': {}. Skipping.", entry.path().display(), e),
            }
        }

        names.sort();
        Ok(names)
    }

    async fn build_track(
        &self,
        layout: &StorageLayout,
        key: &SessionKey,
        participant: &str,
    ) -> Result<Track, SkipReason> {
        let output = layout.track_path(key, participant, self.options.format);
        remove_stale(&output)
            .await
            .map_err(|e| SkipReason::Unreadable(e.to_string()))?;

        let dir = layout.participant_dir(key, participant);
        let chunks = self
            .valid_chunks(&dir)
            .await
            .map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        if chunks.is_empty() {
            return Err(SkipReason::NoValidChunks);
        }

        for chunk in &chunks {
            debug!("  {} ({} bytes)", chunk.name.file_name(), chunk.len);
        }

        let list_file = layout.concat_list_path(key, participant);
        let paths: Vec<&Path> = chunks.iter().map(|c| c.path.as_path()).collect();
        fs::write(&list_file, concat_list(&paths))
            .await
            .map_err(|e| SkipReason::ConcatFailed(e.to_string()))?;

        info!("Concatenating {} chunks for '{}'", chunks.len(), participant);
        self.media
            .concat(&list_file, &output)
            .await
            .map_err(|e| SkipReason::ConcatFailed(e.to_string()))?;

        Ok(Track {
            participant: participant.to_owned(),
            path: output,
            chunks: chunks.len(),
            bytes: chunks.iter().map(|c| c.len).sum(),
        })
    }

    /// Chunks above the size threshold, in recording order.
    async fn valid_chunks(&self, dir: &Path) -> io::Result<Vec<ValidChunk>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut seen = 0usize;
        let mut chunks = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().and_then(ChunkName::parse) else {
                continue;
            };
            if name.format != self.options.format {
                continue;
            }
            seen += 1;

            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("Could not stat '{}': {}", entry.path().display(), e);
                    continue;
                }
            };
            if meta.is_file() && meta.len() > self.options.min_chunk_bytes {
                chunks.push(ValidChunk {
                    name,
                    path: entry.path(),
                    len: meta.len(),
                });
            }
        }

        chunks.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("{}: {} of {} chunks usable", dir.display(), chunks.len(), seen);
        Ok(chunks)
    }
}

/// Deletes an output left by an earlier run, so a file on disk always
/// belongs to the latest report.
async fn remove_stale(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed previous output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
