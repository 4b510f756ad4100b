use async_trait::async_trait;
use duet_core::SessionKey;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start merge job: {0}")]
    Spawn(#[from] std::io::Error),
}

/// How one merge job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRun {
    pub success: bool,
    pub code: Option<i32>,
}

/// Runs the merge for one session.
#[async_trait]
pub trait MergeLauncher: Send + Sync + 'static {
    async fn launch(&self, key: &SessionKey) -> Result<MergeRun, LaunchError>;
}

/// Runs the `duet-merge` executable as a child process.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    pub program: PathBuf,
    pub storage_root: PathBuf,
    pub min_chunk_bytes: u64,
}

impl CommandLauncher {
    pub fn args(&self, key: &SessionKey) -> Vec<String> {
        vec![
            "--storage-root".to_owned(),
            self.storage_root.display().to_string(),
            "--min-chunk-bytes".to_owned(),
            self.min_chunk_bytes.to_string(),
            "--".to_owned(),
            key.to_string(),
        ]
    }
}

#[async_trait]
impl MergeLauncher for CommandLauncher {
    async fn launch(&self, key: &SessionKey) -> Result<MergeRun, LaunchError> {
        info!("Running merge job: {} {}", self.program.display(), self.args(key).join(" "));

        let output = Command::new(&self.program)
            .args(self.args(key))
            .stdin(Stdio::null())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!("[merge {}] {}", key, line);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!("[merge {}] {}", key, line);
        }

        Ok(MergeRun {
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}
