//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use audithub_entity::audit::{AuditRecord, AuditStatus, Platform};
use audithub_entity::job::QueueCounts;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body of the 202 Accepted response for a new audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditAcceptedResponse {
    /// Created record id; poll it for progress.
    pub id: Uuid,
    /// Initial status (`pending`).
    pub status: AuditStatus,
    /// Target platform.
    pub platform: Platform,
    /// Target username.
    pub username: String,
    /// When the audit was accepted.
    pub created_at: DateTime<Utc>,
}

impl From<&AuditRecord> for AuditAcceptedResponse {
    fn from(record: &AuditRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            platform: record.influencer.platform,
            username: record.influencer.username.clone(),
            created_at: record.created_at,
        }
    }
}

/// Queue statistics response (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatsResponse {
    /// Queue depth snapshot.
    pub stats: QueueCounts,
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is up.
    pub status: String,
}
