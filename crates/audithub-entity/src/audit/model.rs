//! Audit record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::metrics::AuditMetrics;
use super::platform::Platform;
use super::quality::QualityAnalysis;
use super::status::AuditStatus;

/// Descriptive fields of the audited influencer profile.
///
/// `platform` and `username` identify the target and are immutable after
/// creation; the remaining fields are filled in on successful collection.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InfluencerProfile {
    /// Target platform.
    pub platform: Platform,
    /// Target username.
    pub username: String,
    /// Display name shown on the profile.
    pub display_name: String,
    /// Profile picture URL.
    pub profile_picture: String,
    /// Profile biography text.
    pub bio: String,
    /// Whether the platform marks the profile as verified.
    pub verified: bool,
    /// Canonical public profile URL.
    pub profile_url: String,
}

/// The persisted unit of audit work and its result.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Owning user. Immutable.
    pub owner_id: Uuid,
    /// Influencer profile data.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub influencer: InfluencerProfile,
    /// Collected metrics. Zero-valued before completion.
    #[sqlx(flatten)]
    pub metrics: AuditMetrics,
    /// Quality analysis. Zero/empty before completion.
    #[sqlx(json)]
    pub quality_analysis: QualityAnalysis,
    /// Current lifecycle status.
    pub status: AuditStatus,
    /// Failure reason. Present exactly when `status` is `failed`.
    pub error: Option<String>,
    /// Wall-clock processing duration, set on completion.
    pub processing_time_ms: Option<i64>,
    /// When the audit was accepted.
    pub created_at: DateTime<Utc>,
    /// When a worker started processing.
    pub started_at: Option<DateTime<Utc>>,
    /// When the audit reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAudit {
    /// Owning user.
    pub owner_id: Uuid,
    /// Target platform.
    pub platform: Platform,
    /// Target username.
    pub username: String,
}

/// Lightweight status projection served to polling clients.
///
/// Deliberately excludes metrics and quality analysis so the poll path
/// stays cheap.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditStatusView {
    /// Record identifier.
    pub id: Uuid,
    /// Current lifecycle status.
    pub status: AuditStatus,
    /// When the audit was accepted.
    pub created_at: DateTime<Utc>,
    /// When a worker started processing.
    pub started_at: Option<DateTime<Utc>>,
    /// When the audit reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure reason, if failed.
    pub error: Option<String>,
}
