use crate::merge::merge_command::{MergeCommand, MergeHandle};
use crate::merge::merge_launcher::MergeLauncher;
use duet_core::SessionKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Events the scheduler sends to itself from timers and job tasks.
enum MergeEvent {
    Due { key: SessionKey, generation: u64 },
    Finished { key: SessionKey },
}

enum JobState {
    /// Waiting out the grace delay. Only the timer carrying the current
    /// generation may start the job.
    Pending { generation: u64 },
    /// A job is running; `rerun` queues one more pass once it exits.
    Running { rerun: bool },
}

/// Delays and serializes merge jobs per session key.
///
/// Repeated requests while a merge is pending restart the grace delay and
/// still produce one job. Requests that arrive while a job runs produce
/// exactly one follow-up job. Different keys are independent.
pub struct MergeScheduler {
    launcher: Arc<dyn MergeLauncher>,
    grace_delay: Duration,
    command_rx: mpsc::UnboundedReceiver<MergeCommand>,
    event_rx: mpsc::UnboundedReceiver<MergeEvent>,
    event_tx: mpsc::UnboundedSender<MergeEvent>,
    jobs: HashMap<SessionKey, JobState>,
    next_generation: u64,
}

impl MergeScheduler {
    pub fn new(launcher: Arc<dyn MergeLauncher>, grace_delay: Duration) -> (Self, MergeHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            launcher,
            grace_delay,
            command_rx,
            event_rx,
            event_tx,
            jobs: HashMap::new(),
            next_generation: 0,
        };
        (scheduler, MergeHandle::new(command_tx))
    }

    /// Runs until every handle is dropped and no job is left.
    pub async fn run(mut self) {
        info!("Merge scheduler started (grace delay {:?})", self.grace_delay);
        let mut accepting = true;

        loop {
            if !accepting && self.jobs.is_empty() {
                break;
            }

            tokio::select! {
                cmd = self.command_rx.recv(), if accepting => {
                    match cmd {
                        Some(MergeCommand::Schedule(key)) => self.schedule(key),
                        None => {
                            info!("All merge handles dropped, draining {} job(s)", self.jobs.len());
                            accepting = false;
                        }
                    }
                }

                Some(evt) = self.event_rx.recv() => self.handle_event(evt),
            }
        }

        info!("Merge scheduler finished");
    }

    fn schedule(&mut self, key: SessionKey) {
        match self.jobs.get_mut(&key) {
            Some(JobState::Running { rerun }) => {
                info!("Merge for '{}' is running, queueing another pass", key);
                *rerun = true;
            }
            Some(JobState::Pending { .. }) => {
                info!("Merge for '{}' already pending, restarting grace delay", key);
                self.arm(key);
            }
            None => {
                info!("Merge for '{}' scheduled in {:?}", key, self.grace_delay);
                self.arm(key);
            }
        }
    }

    fn arm(&mut self, key: SessionKey) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.jobs.insert(key.clone(), JobState::Pending { generation });

        let delay = self.grace_delay;
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(MergeEvent::Due { key, generation });
        });
    }

    fn handle_event(&mut self, event: MergeEvent) {
        match event {
            MergeEvent::Due { key, generation } => {
                let current = matches!(
                    self.jobs.get(&key),
                    Some(JobState::Pending { generation: g }) if *g == generation
                );
                if !current {
                    return;
                }
                self.jobs.insert(key.clone(), JobState::Running { rerun: false });
                self.start(key);
            }

            MergeEvent::Finished { key } => match self.jobs.remove(&key) {
                Some(JobState::Running { rerun: true }) => {
                    info!("Starting queued merge pass for '{}'", key);
                    self.arm(key);
                }
                Some(JobState::Running { rerun: false }) => {}
                Some(state @ JobState::Pending { .. }) => {
                    warn!("Merge for '{}' finished while marked pending", key);
                    self.jobs.insert(key, state);
                }
                None => warn!("Merge for '{}' finished but was not tracked", key),
            },
        }
    }

    fn start(&self, key: SessionKey) {
        let launcher = self.launcher.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            info!("Merging session '{}'", key);
            match launcher.launch(&key).await {
                Ok(run) if run.success => info!("Merge for '{}' completed", key),
                Ok(run) => error!("Merge for '{}' failed with exit code {:?}", key, run.code),
                Err(e) => error!("Merge for '{}' could not run: {}", key, e),
            }
            let _ = tx.send(MergeEvent::Finished { key });
        });
    }
}
