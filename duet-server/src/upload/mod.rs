mod chunk_store;
mod upload_handler;

pub use chunk_store::*;
pub use upload_handler::*;
