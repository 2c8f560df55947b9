//! Job status and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting to be picked up by a worker (includes backoff waits).
    Pending,
    /// Currently held by a worker for one attempt.
    Running,
    /// Successfully completed.
    Completed,
    /// Failed after all delivery attempts, archived.
    Failed,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheduling priority class for a queued job.
///
/// Strict priority: elevated jobs are always dispatched before normal
/// ones; within a class, dispatch is FIFO by enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    /// Default priority.
    Normal,
    /// Premium-tier priority, dispatched first.
    Elevated,
}

impl JobPriority {
    /// Return the numeric priority (higher = more urgent).
    pub fn numeric_priority(&self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::Elevated => 10,
        }
    }

    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
        }
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
