//! Bounded job queue and the proofing worker pool that drains it.

use std::sync::Arc;
use std::time::Duration;

use idproof_proofing::{ProofingError, ProofingJob, ProofingOrchestrator};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::ShutdownController;

/// Delay before a job rejected as a duplicate is offered again.
pub const REQUEUE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("job queue is full")]
    Full,

    #[error("job queue is closed")]
    Closed,
}

/// Sending side of the queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<ProofingJob>,
}

/// Receiving side, shared by every worker.
pub type JobReceiver = Arc<Mutex<mpsc::Receiver<ProofingJob>>>;

impl JobQueue {
    pub fn bounded(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, Arc::new(Mutex::new(rx)))
    }

    /// Accept a job without waiting for space.
    pub fn try_enqueue(&self, job: ProofingJob) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Jobs accepted but not yet picked up.
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Start `count` workers. Each subscribes to `shutdown` before this
/// function returns, so a later shutdown reaches all of them.
pub fn spawn_workers(
    count: usize,
    orchestrator: Arc<ProofingOrchestrator>,
    queue: JobQueue,
    receiver: JobReceiver,
    shutdown: &ShutdownController,
) -> JoinSet<()> {
    let mut workers = JoinSet::new();
    for worker_id in 0..count {
        let orchestrator = orchestrator.clone();
        let queue = queue.clone();
        let receiver = receiver.clone();
        let mut shutdown_rx = shutdown.subscribe();
        workers.spawn(async move {
            loop {
                let next = tokio::select! {
                    job = async { receiver.lock().await.recv().await } => job,
                    _ = shutdown_rx.recv() => break,
                };
                let Some(job) = next else {
                    break;
                };

                match orchestrator.run_until_cancelled(job.clone(), &mut shutdown_rx).await {
                    Ok(report) => {
                        tracing::debug!(
                            worker = worker_id,
                            result_id = %report.result.handle,
                            state = report.final_state.as_str(),
                            "job finished"
                        );
                    }
                    Err(ProofingError::DuplicateInFlight(handle)) => {
                        tracing::info!(worker = worker_id, result_id = %handle, "requeueing duplicate job");
                        requeue_later(queue.clone(), job);
                    }
                    Err(ProofingError::Cancelled) => break,
                    Err(e) => {
                        tracing::error!(
                            worker = worker_id,
                            result_id = %job.result_id,
                            error = %e,
                            "job could not start"
                        );
                    }
                }
            }
            tracing::debug!(worker = worker_id, "worker stopped");
        });
    }
    workers
}

fn requeue_later(queue: JobQueue, job: ProofingJob) {
    tokio::spawn(async move {
        tokio::time::sleep(REQUEUE_DELAY).await;
        let handle = job.result_id.clone();
        if let Err(e) = queue.try_enqueue(job) {
            tracing::warn!(result_id = %handle, error = %e, "dropping duplicate job");
        }
    });
}
