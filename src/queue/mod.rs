//! Background job queue
//!
//! Dispatchers hand jobs to a [`JobQueue`] and return right away. A single
//! scheduler loop takes jobs off the queue in admission order and spawns each
//! one as its own task, so a later job may finish before an earlier one.
//!
//! The queue holds `capacity` slots. A job takes a slot when it is submitted
//! and gives it back when it has finished running, so at most `capacity` jobs
//! are waiting or running at any moment; further submissions are refused.
//!
//! There is no job handle, status query or cancellation. What the scheduler
//! does guarantee is that every outcome is logged and counted:
//! - success → `info`
//! - error returned by the job → `error`
//! - panic → `error`

pub mod jobs;
pub mod workers;

pub use jobs::Job;
pub use workers::Worker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::types::{AppError, AppResult};

/// A job that holds one queue slot until it is dropped.
#[derive(Debug)]
pub struct QueuedJob {
    pub job: Job,
    _slot: OwnedSemaphorePermit,
}

/// Submit side of the job queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<QueuedJob>,
    slots: Arc<Semaphore>,
    stats: Arc<SchedulerStats>,
}

impl JobQueue {
    /// Create a queue that admits at most `capacity` outstanding jobs,
    /// counting both waiting and running ones.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<QueuedJob>) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let queue = Self {
            sender,
            slots: Arc::new(Semaphore::new(capacity)),
            stats: Arc::new(SchedulerStats::default()),
        };
        (queue, receiver)
    }

    /// Enqueue a job without waiting. No free slot or a stopped scheduler is
    /// reported as `AppError::Unavailable`.
    pub fn submit(&self, job: Job) -> AppResult<()> {
        let kind = job.kind();
        let slot = self
            .slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| AppError::Unavailable("job queue is full".to_string()))?;

        match self.sender.try_send(QueuedJob { job, _slot: slot }) {
            Ok(()) => {
                self.stats.admitted.fetch_add(1, Ordering::Relaxed);
                debug!(kind, "Job admitted");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(AppError::Unavailable("job queue is full".to_string())),
            Err(TrySendError::Closed(_)) => {
                Err(AppError::Unavailable("job queue is closed".to_string()))
            }
        }
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        self.stats.clone()
    }
}

/// Outcome counters, shared between the queue and the scheduler.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    admitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub admitted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl SchedulerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct Scheduler;

impl Scheduler {
    /// Start the scheduler loop. It runs until every `JobQueue` clone has
    /// been dropped.
    pub fn spawn(
        mut receiver: mpsc::Receiver<QueuedJob>,
        worker: Arc<Worker>,
        stats: Arc<SchedulerStats>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Job scheduler started");
            while let Some(queued) = receiver.recv().await {
                tokio::spawn(run_job(worker.clone(), queued, stats.clone()));
            }
            info!("Job queue closed, scheduler stopping");
        })
    }
}

async fn run_job(worker: Arc<Worker>, queued: QueuedJob, stats: Arc<SchedulerStats>) {
    let QueuedJob { job, _slot: slot } = queued;
    let job_id = Uuid::new_v4();
    let span = info_span!("job", %job_id, kind = job.kind());

    async move {
        info!("Job started");
        let started = Instant::now();
        let outcome = tokio::spawn(async move { worker.process_job(job).await }).await;

        match outcome {
            Ok(Ok(())) => {
                stats.succeeded.fetch_add(1, Ordering::Relaxed);
                info!(elapsed_ms = started.elapsed().as_millis() as u64, "Job finished");
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Job failed");
            }
            Err(join_error) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %join_error, "Job panicked");
            }
        }

        // The slot frees up only once the job is completely done
        drop(slot);
    }
    .instrument(span)
    .await
}
