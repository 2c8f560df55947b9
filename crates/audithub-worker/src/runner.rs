//! Worker runner — main loop that polls for jobs and executes them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing;

use audithub_core::config::worker::WorkerConfig;
use audithub_entity::job::Job;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::queue::JobQueue;

/// Main worker runner that polls the queue and executes claimed jobs.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job queue for claiming work.
    queue: Arc<JobQueue>,
    /// Job executor for dispatching.
    executor: Arc<JobExecutor>,
    /// Worker configuration.
    config: WorkerConfig,
    /// Worker identifier.
    worker_id: String,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        queue: Arc<JobQueue>,
        executor: Arc<JobExecutor>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            queue,
            executor,
            config,
            worker_id,
        }
    }

    /// Start the worker runner — runs until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Worker '{}' started with concurrency={}, poll_interval={}s",
            self.worker_id,
            self.config.concurrency,
            self.config.poll_interval_seconds
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Worker '{}' received shutdown signal", self.worker_id);
                        break;
                    }
                }
                claimed = self.poll_and_execute(&semaphore) => {
                    // Back off only when the queue was empty; drain
                    // immediately while work is available.
                    if !claimed {
                        tokio::select! {
                            _ = cancel.changed() => {
                                if *cancel.borrow() {
                                    tracing::info!("Worker '{}' shutting down", self.worker_id);
                                    break;
                                }
                            }
                            _ = time::sleep(poll_interval) => {}
                        }
                    }
                }
            }
        }

        tracing::info!(
            "Worker '{}' waiting for in-flight jobs to complete...",
            self.worker_id
        );

        let max_permits = self.config.concurrency as u32;
        let _ = tokio::time::timeout(
            Duration::from_secs(30),
            semaphore.acquire_many(max_permits),
        )
        .await;

        tracing::info!("Worker '{}' shut down complete", self.worker_id);
    }

    /// Poll for a job and execute it if available. Returns whether a job
    /// was claimed.
    async fn poll_and_execute(&self, semaphore: &Arc<tokio::sync::Semaphore>) -> bool {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::trace!("All worker slots occupied, waiting...");
                time::sleep(Duration::from_millis(100)).await;
                return false;
            }
        };

        match self.queue.dequeue().await {
            Ok(Some(job)) => {
                let queue = Arc::clone(&self.queue);
                let executor = Arc::clone(&self.executor);
                let heartbeat_interval =
                    Duration::from_secs(self.config.heartbeat_interval_seconds);

                tokio::spawn(async move {
                    let _permit = permit;
                    process_job(queue, executor, job, heartbeat_interval).await;
                });
                true
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No jobs available");
                false
            }
            Err(e) => {
                drop(permit);
                tracing::error!("Failed to claim job: {}", e);
                false
            }
        }
    }
}

/// Run one claimed job to its outcome, heartbeating while it executes.
async fn process_job(
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    job: Job,
    heartbeat_interval: Duration,
) {
    tracing::info!(
        "Processing job: id={}, type='{}', attempt={}/{}",
        job.id,
        job.job_type,
        job.attempts,
        job.max_attempts
    );

    let execution = executor.execute(&job);
    tokio::pin!(execution);

    let mut ticker = time::interval(heartbeat_interval);
    // The first tick fires immediately; the claim already stamped a
    // heartbeat, so consume it.
    ticker.tick().await;

    let result = loop {
        tokio::select! {
            result = &mut execution => break result,
            _ = ticker.tick() => {
                if let Err(e) = queue.heartbeat(job.id).await {
                    tracing::warn!("Failed to heartbeat job {}: {}", job.id, e);
                }
            }
        }
    };

    match result {
        Ok(()) => {
            if let Err(e) = queue.complete(&job).await {
                tracing::error!("Failed to mark job {} as completed: {}", job.id, e);
            }
            tracing::info!("Job {} completed successfully", job.id);
        }
        Err(JobExecutionError::Transient(msg)) => {
            tracing::warn!("Job {} failed (transient): {}", job.id, msg);
            if let Err(e) = queue.retry_or_fail(&job, &msg).await {
                tracing::error!("Failed to settle failed job {}: {}", job.id, e);
            }
        }
        Err(JobExecutionError::Permanent(msg)) => {
            tracing::error!("Job {} failed permanently: {}", job.id, msg);
            if let Err(e) = queue.fail(&job, &msg).await {
                tracing::error!("Failed to mark job {} as failed: {}", job.id, e);
            }
        }
        Err(JobExecutionError::Internal(err)) => {
            let msg = err.to_string();
            tracing::error!("Job {} internal error: {}", job.id, msg);
            if let Err(e) = queue.retry_or_fail(&job, &msg).await {
                tracing::error!("Failed to settle failed job {}: {}", job.id, e);
            }
        }
    }
}
