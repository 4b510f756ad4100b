//! Offline merge of one session's uploaded chunks: every participant's
//! chunks are stream-copied into one track, and two or more tracks are
//! mixed into a single file.

pub mod media;
pub mod pipeline;

pub use media::*;
pub use pipeline::*;
