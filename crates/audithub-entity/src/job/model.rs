//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{JobPriority, JobStatus};

/// A queued unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Job type identifier (e.g., `"audit_process"`).
    pub job_type: String,
    /// Scheduling priority class.
    pub priority: JobPriority,
    /// Job-specific payload (JSON, see [`super::payload::JobPayload`]).
    pub payload: serde_json::Value,
    /// Error message from the most recent failed attempt.
    pub error_message: Option<String>,
    /// Current job status.
    pub status: JobStatus,
    /// Number of delivery attempts so far (incremented on claim).
    pub attempts: i32,
    /// Maximum allowed attempts.
    pub max_attempts: i32,
    /// Earliest execution time (backoff); `None` means immediate.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When the current/last attempt started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last heartbeat from the worker holding this job.
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    /// Worker that claimed the current attempt.
    pub worker_id: Option<String>,
    /// User on whose behalf the job was created.
    pub created_by: Option<Uuid>,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Whether another delivery attempt is allowed after a failure.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Whether the current attempt is the final one.
    pub fn is_final_attempt(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// Data required to enqueue a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    /// Job type identifier.
    pub job_type: String,
    /// Priority class.
    pub priority: JobPriority,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Maximum delivery attempts.
    pub max_attempts: i32,
    /// Earliest execution time.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// User on whose behalf the job was created.
    pub created_by: Option<Uuid>,
}

/// Read-only snapshot of queue depth by state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Jobs waiting for dispatch (including backoff waits).
    pub waiting: i64,
    /// Jobs currently held by workers.
    pub active: i64,
    /// Jobs that completed successfully.
    pub completed: i64,
    /// Jobs archived after exhausting their attempts.
    pub failed: i64,
}
