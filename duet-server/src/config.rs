use duet_core::MIN_VALID_CHUNK_BYTES;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "DUET";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Root of the chunk store; one directory per session below it.
    pub storage_root: PathBuf,
    pub upload_limit_bytes: usize,
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Wait after a departure so the last chunks can land.
    pub grace_delay_secs: u64,
    /// Merge executable, resolved through `PATH` when relative.
    pub program: PathBuf,
    pub min_chunk_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            storage_root: PathBuf::from("uploads"),
            upload_limit_bytes: 16 * 1024 * 1024,
            merge: MergeConfig::default(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            grace_delay_secs: 8,
            program: PathBuf::from("duet-merge"),
            min_chunk_bytes: MIN_VALID_CHUNK_BYTES,
        }
    }
}

impl MergeConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_secs(self.grace_delay_secs)
    }
}

impl ServerConfig {
    /// Defaults, then the optional file, then `DUET__*` environment
    /// variables (`DUET__MERGE__GRACE_DELAY_SECS=3`).
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
