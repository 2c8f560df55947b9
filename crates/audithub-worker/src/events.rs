//! Job outcome events.
//!
//! Outcomes are published on a broadcast channel rather than ambient
//! callbacks; any interested party (notifier bridge, metrics, tests)
//! subscribes via [`crate::queue::JobQueue::subscribe`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal or scheduling outcome of one job delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    /// The job completed successfully.
    Completed,
    /// The attempt failed; the job was rescheduled with backoff.
    Retried {
        /// The attempt number that failed.
        attempt: i32,
    },
    /// The job exhausted its attempts (or failed permanently) and was
    /// archived.
    Failed,
    /// A stalled delivery was detected and the job was requeued.
    Stalled,
}

/// One job outcome event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    /// The job this event concerns.
    pub job_id: Uuid,
    /// The job's type identifier.
    pub job_type: String,
    /// The job payload, for subscribers that need context.
    pub payload: serde_json::Value,
    /// What happened.
    pub outcome: JobOutcome,
}
