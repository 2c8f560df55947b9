//! Job executor — dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing;

use audithub_core::error::AppError;
use audithub_entity::job::Job;

/// Trait for job handler implementations.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Get the job type this handler processes.
    fn job_type(&self) -> &str;

    /// Execute one delivery attempt of the job.
    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError>;
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure — do not retry.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure — may retry.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches jobs to the appropriate handler based on `job_type`.
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by type.
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a job handler.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!("Registered job handler for type '{}'", job_type);
        self.handlers.insert(job_type, handler);
    }

    /// Execute a job by dispatching to the correct handler.
    pub async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let handler = self.handlers.get(&job.job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{}'",
                job.job_type
            ))
        })?;

        tracing::info!(
            "Executing job: id={}, type='{}', attempt={}/{}",
            job.id,
            job.job_type,
            job.attempts,
            job.max_attempts
        );

        handler.execute(job).await
    }

    /// Check if a handler is registered for a job type.
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }
}
