//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use audithub_core::config::worker::WorkerConfig;
use audithub_core::error::AppError;
use audithub_entity::job::{JobPayload, JobPriority};

use crate::queue::JobQueue;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Job queue for enqueuing scheduled work and reaping stalls.
    queue: Arc<JobQueue>,
    /// Worker configuration (stall timeout).
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(queue: Arc<JobQueue>, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            queue,
            config,
        })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_stall_reaper().await?;
        self.register_queue_cleanup().await?;
        self.register_usage_reset().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Stall reaper — every 30 seconds.
    ///
    /// Runs directly against the queue rather than through it: a stalled
    /// queue cannot be relied on to process its own redelivery job.
    async fn register_stall_reaper(&self) -> Result<(), AppError> {
        let queue = Arc::clone(&self.queue);
        let stall_timeout = chrono::Duration::seconds(self.config.stall_timeout_seconds as i64);

        let job = CronJob::new_async("*/30 * * * * *", move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                let cutoff = Utc::now() - stall_timeout;
                match queue.reap_stalled(cutoff).await {
                    Ok(0) => {}
                    Ok(n) => tracing::warn!("Redelivered {} stalled job(s)", n),
                    Err(e) => tracing::error!("Stall reaper failed: {}", e),
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create stall_reaper schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add stall_reaper schedule: {}", e)))?;

        tracing::info!("Registered: stall_reaper (every 30s)");
        Ok(())
    }

    /// Queue cleanup — every day at 3 AM.
    async fn register_queue_cleanup(&self) -> Result<(), AppError> {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async("0 0 3 * * *", move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                tracing::debug!("Scheduling queue cleanup job");
                if let Err(e) = queue
                    .enqueue(&JobPayload::QueueCleanup, JobPriority::Normal, None)
                    .await
                {
                    tracing::error!("Failed to enqueue queue_cleanup: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create queue_cleanup schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add queue_cleanup schedule: {}", e))
        })?;

        tracing::info!("Registered: queue_cleanup (daily at 3AM)");
        Ok(())
    }

    /// Monthly usage reset — first of the month at midnight.
    async fn register_usage_reset(&self) -> Result<(), AppError> {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async("0 0 0 1 * *", move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                tracing::debug!("Scheduling usage reset job");
                if let Err(e) = queue
                    .enqueue(&JobPayload::UsageReset, JobPriority::Normal, None)
                    .await
                {
                    tracing::error!("Failed to enqueue usage_reset: {}", e);
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create usage_reset schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add usage_reset schedule: {}", e)))?;

        tracing::info!("Registered: usage_reset (monthly)");
        Ok(())
    }
}
