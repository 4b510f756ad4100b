use duet_core::SessionKey;
use tokio::sync::mpsc;
use tracing::error;

/// Requests accepted by the merge scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeCommand {
    /// Merge this session's chunks once the grace delay has passed.
    Schedule(SessionKey),
}

/// Cheap handle used to queue merges without waiting for them.
#[derive(Clone)]
pub struct MergeHandle {
    tx: mpsc::UnboundedSender<MergeCommand>,
}

impl MergeHandle {
    pub fn new(tx: mpsc::UnboundedSender<MergeCommand>) -> Self {
        Self { tx }
    }

    pub fn schedule(&self, key: SessionKey) {
        if let Err(e) = self.tx.send(MergeCommand::Schedule(key)) {
            error!("Merge scheduler is gone, dropping {:?}", e.0);
        }
    }
}
