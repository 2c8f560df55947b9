//! Scheduled maintenance job handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing;

use audithub_database::store::UsageStore;
use audithub_entity::job::Job;

use crate::executor::{JobExecutionError, JobHandler};
use crate::queue::JobQueue;

/// Prunes old terminal jobs from the queue.
#[derive(Debug)]
pub struct QueueCleanupHandler {
    /// Queue to clean.
    queue: Arc<JobQueue>,
}

impl QueueCleanupHandler {
    /// Create a new queue cleanup handler.
    pub fn new(queue: Arc<JobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl JobHandler for QueueCleanupHandler {
    fn job_type(&self) -> &str {
        "queue_cleanup"
    }

    async fn execute(&self, _job: &Job) -> Result<(), JobExecutionError> {
        let deleted = self
            .queue
            .cleanup()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Queue cleanup failed: {e}")))?;

        tracing::info!("Queue cleanup removed {} old job(s)", deleted);
        Ok(())
    }
}

/// Resets per-user monthly usage counters at the start of a new period.
#[derive(Debug)]
pub struct UsageResetHandler {
    /// Usage counter store.
    usage: Arc<dyn UsageStore>,
}

impl UsageResetHandler {
    /// Create a new usage reset handler.
    pub fn new(usage: Arc<dyn UsageStore>) -> Self {
        Self { usage }
    }
}

#[async_trait]
impl JobHandler for UsageResetHandler {
    fn job_type(&self) -> &str {
        "usage_reset"
    }

    async fn execute(&self, _job: &Job) -> Result<(), JobExecutionError> {
        let reset = self
            .usage
            .reset_all()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Usage reset failed: {e}")))?;

        tracing::info!("Monthly usage reset for {} user(s)", reset);
        Ok(())
    }
}
