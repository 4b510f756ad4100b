pub mod fake_media;

pub use fake_media::*;

use std::path::Path;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Writes `size` bytes of `fill` as `<session>/<participant>/<name>`.
pub fn write_chunk(root: &Path, session: &str, participant: &str, name: &str, size: usize, fill: u8) {
    let dir = root.join(session).join(participant);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), vec![fill; size]).unwrap();
}
