use async_trait::async_trait;
use duet_merge::{MediaError, MediaTool};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    Concat { inputs: Vec<PathBuf>, output: PathBuf },
    Mix { inputs: Vec<PathBuf>, output: PathBuf },
}

/// MediaTool that joins files byte for byte and records every call.
#[derive(Clone, Default)]
pub struct FakeMedia {
    calls: Arc<Mutex<Vec<MediaCall>>>,
    failing_tracks: HashSet<String>,
    fail_mix: bool,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concat into `file_name` fails.
    pub fn failing_track(mut self, file_name: &str) -> Self {
        self.failing_tracks.insert(file_name.to_owned());
        self
    }

    pub fn failing_mix(mut self) -> Self {
        self.fail_mix = true;
        self
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mix_calls(&self) -> Vec<MediaCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, MediaCall::Mix { .. }))
            .collect()
    }

    fn failure(what: &str) -> MediaError {
        MediaError::Failed {
            program: "fake-ffmpeg".to_owned(),
            code: Some(1),
            stderr: format!("{what} refused"),
        }
    }
}

fn parse_list(list: &str) -> Vec<PathBuf> {
    list.lines()
        .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\''))
        .map(|path| PathBuf::from(path.replace(r"'\''", "'")))
        .collect()
}

#[async_trait]
impl MediaTool for FakeMedia {
    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), MediaError> {
        let list = std::fs::read_to_string(list_file).unwrap();
        let inputs = parse_list(&list);
        self.calls.lock().unwrap().push(MediaCall::Concat {
            inputs: inputs.clone(),
            output: output.to_path_buf(),
        });

        let name = output.file_name().unwrap().to_string_lossy().into_owned();
        if self.failing_tracks.contains(&name) {
            return Err(Self::failure("concat"));
        }

        let mut joined = Vec::new();
        for input in &inputs {
            joined.extend(std::fs::read(input).unwrap());
        }
        std::fs::write(output, joined).unwrap();
        Ok(())
    }

    async fn mix(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MediaError> {
        self.calls.lock().unwrap().push(MediaCall::Mix {
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
        });
        if self.fail_mix {
            return Err(Self::failure("mix"));
        }
        std::fs::write(output, b"mixed").unwrap();
        Ok(())
    }
}
