//! Typed job payload definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::platform::Platform;

/// Typed payloads for known job types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum JobPayload {
    /// Process one audit: collect the profile, score it, persist results.
    #[serde(rename = "audit_process")]
    AuditProcess {
        /// Audit record to process.
        audit_id: Uuid,
        /// Target platform.
        platform: Platform,
        /// Target username.
        username: String,
        /// Owning user.
        owner_id: Uuid,
    },
    /// Prune old completed/failed jobs from the queue.
    #[serde(rename = "queue_cleanup")]
    QueueCleanup,
    /// Reset all per-user monthly usage counters.
    #[serde(rename = "usage_reset")]
    UsageReset,
}

impl JobPayload {
    /// Job type string for this payload, matching the serde tag.
    pub fn job_type(&self) -> &'static str {
        match self {
            Self::AuditProcess { .. } => "audit_process",
            Self::QueueCleanup => "queue_cleanup",
            Self::UsageReset => "usage_reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_with_job_type_tag() {
        let payload = JobPayload::AuditProcess {
            audit_id: Uuid::new_v4(),
            platform: Platform::Instagram,
            username: "validuser".to_string(),
            owner_id: Uuid::new_v4(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["job_type"], "audit_process");
        let back: JobPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back.job_type(), payload.job_type());
    }
}
