mod session;
mod session_registry;

pub use session::*;
pub use session_registry::*;
