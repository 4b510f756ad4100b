//! Signaling coordinator for two-party recorded calls.
//!
//! Connections join a session by key, the second one is told to initiate
//! the peer negotiation, opaque negotiation payloads are relayed between the
//! two, and every departure stops the remaining recording and queues the
//! out-of-process merge of the uploaded chunks.

pub mod config;
pub mod coordinator;
pub mod merge;
pub mod routes;
pub mod session;
pub mod signaling;
pub mod state;
pub mod upload;

pub use self::config::{MergeConfig, ServerConfig};
pub use coordinator::*;
pub use merge::*;
pub use routes::create_router;
pub use session::*;
pub use signaling::*;
pub use state::AppState;
pub use upload::*;
