use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Lines of tool stderr kept in an error.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// The two media operations the merge needs.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Stream-copies the files named in `list_file` into `output`, in list
    /// order, without re-encoding.
    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), MediaError>;

    /// Mixes `inputs` into one audio file as long as the longest input.
    async fn mix(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MediaError>;
}

/// Renders a list file for the ffmpeg concat demuxer.
pub fn concat_list<P: AsRef<Path>>(files: &[P]) -> String {
    let mut list = String::new();
    for file in files {
        let path = file.as_ref().to_string_lossy().replace('\\', "/");
        list.push_str("file '");
        list.push_str(&path.replace('\'', r"'\''"));
        list.push_str("'\n");
    }
    list
}

pub fn concat_args(list_file: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-f", "concat", "-safe", "0", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(list_file.into());
    args.extend(["-c", "copy"].map(OsString::from));
    args.push(output.into());
    args
}

pub fn mix_args(inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
    let mut args = Vec::with_capacity(inputs.len() * 2 + 4);
    for input in inputs {
        args.push(OsString::from("-i"));
        args.push(input.into());
    }
    args.push("-filter_complex".into());
    args.push(format!("amix=inputs={}:duration=longest", inputs.len()).into());
    args.push("-y".into());
    args.push(output.into());
    args
}

/// Runs the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), MediaError> {
        let program = self.program.display().to_string();
        debug!("Executing {} {:?}", program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        Err(MediaError::Failed {
            program,
            code: output.status.code(),
            stderr: tail,
        })
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), MediaError> {
        self.run(concat_args(list_file, output)).await
    }

    async fn mix(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MediaError> {
        self.run(mix_args(inputs, output)).await
    }
}
