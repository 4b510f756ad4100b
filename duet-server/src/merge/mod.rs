mod merge_command;
mod merge_launcher;
mod merge_scheduler;

pub use merge_command::*;
pub use merge_launcher::*;
pub use merge_scheduler::*;
