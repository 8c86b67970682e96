//! Drain loop — the single consumer of the admission queue.
//!
//! Takes the oldest token, spends `work_duration` on it, and moves on
//! without pausing. On an empty queue it waits for the next admission, but
//! never longer than `idle_wait`, before polling again. The loop has no
//! natural end; it stops only when the shutdown signal flips.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, trace};

use crate::queue::AdmissionQueue;

/// Background consumer for an [`AdmissionQueue`].
pub struct Drainer {
    queue: Arc<AdmissionQueue>,
    work_duration: Duration,
    idle_wait: Duration,
}

impl Drainer {
    pub fn new(queue: Arc<AdmissionQueue>, work_duration: Duration, idle_wait: Duration) -> Self {
        Self {
            queue,
            work_duration,
            idle_wait,
        }
    }

    /// Spawn [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run the drain loop until shutdown is signalled or the sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            capacity = self.queue.capacity(),
            work_ms = self.work_duration.as_millis() as u64,
            idle_ms = self.idle_wait.as_millis() as u64,
            "drain loop started"
        );

        while !*shutdown.borrow() {
            match self.queue.drain() {
                Some(token) => {
                    trace!(seq = token.seq(), "processing token");
                    tokio::select! {
                        _ = tokio::time::sleep(self.work_duration) => {
                            self.queue.mark_processed();
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                None => {
                    tokio::select! {
                        // Timing out is the normal idle path, not an error.
                        _ = tokio::time::timeout(self.idle_wait, self.queue.admitted()) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }

        info!(
            processed = self.queue.processed_total(),
            remaining = self.queue.size(),
            "drain loop stopped"
        );
    }
}
