//! Store contracts consumed by the service and worker layers.
//!
//! The Postgres repositories in [`crate::repositories`] implement these
//! traits; tests substitute in-memory fakes. All status transitions are
//! compare-and-swap against the current status: the losing writer of a
//! race receives `ErrorKind::Conflict` and must treat terminal-state
//! replays as a no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use audithub_core::result::AppResult;
use audithub_core::types::pagination::{PageRequest, PageResponse};
use audithub_entity::audit::{
    AuditMetrics, AuditRecord, AuditStatus, AuditStatusView, InfluencerProfile, NewAudit, Platform,
    QualityAnalysis,
};
use audithub_entity::job::{Job, NewJob, QueueCounts};

/// Optional filters for audit listing.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Restrict to one platform.
    pub platform: Option<Platform>,
    /// Restrict to one status.
    pub status: Option<AuditStatus>,
}

/// Persistence contract for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync + std::fmt::Debug {
    /// Create a new audit record with status `pending`.
    ///
    /// The unique active-audit index is the backstop for the de-dup
    /// pre-check; a violation surfaces as `ErrorKind::Conflict`.
    async fn create(&self, audit: &NewAudit) -> AppResult<AuditRecord>;

    /// Find a record by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AuditRecord>>;

    /// Find the active (pending/in_progress) record for a target, if any.
    async fn find_active(
        &self,
        owner_id: Uuid,
        platform: Platform,
        username: &str,
    ) -> AppResult<Option<AuditRecord>>;

    /// List records for an owner, newest first.
    async fn list(
        &self,
        owner_id: Uuid,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditRecord>>;

    /// Lightweight status projection for the polling path.
    async fn status_view(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<AuditStatusView>>;

    /// CAS `pending → in_progress`, setting `started_at`.
    async fn mark_started(&self, id: Uuid) -> AppResult<()>;

    /// CAS a non-terminal record to `completed`, writing profile fields,
    /// metrics, and quality analysis, and setting `completed_at`.
    async fn mark_completed(
        &self,
        id: Uuid,
        profile: &InfluencerProfile,
        metrics: &AuditMetrics,
        quality: &QualityAnalysis,
        processing_time_ms: i64,
    ) -> AppResult<()>;

    /// CAS a non-terminal record to `failed`, recording the reason and
    /// setting `completed_at`.
    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()>;
}

/// Per-user usage counter contract.
#[async_trait]
pub trait UsageStore: Send + Sync + std::fmt::Debug {
    /// Audits submitted by the user in the current period.
    async fn audits_this_month(&self, owner_id: Uuid) -> AppResult<i64>;

    /// Increment the user's counter, returning the new value.
    async fn increment_audits(&self, owner_id: Uuid) -> AppResult<i64>;

    /// Reset all counters for a new billing period. Returns rows affected.
    async fn reset_all(&self) -> AppResult<u64>;
}

/// Durable queue contract.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Insert a new job with status `pending`.
    async fn create(&self, job: &NewJob) -> AppResult<Job>;

    /// Claim the next dispatchable job for `worker_id`.
    ///
    /// Elevated priority first, then FIFO by enqueue time; jobs in a
    /// backoff window (`scheduled_at` in the future) are skipped. The
    /// claim marks the job running, increments `attempts`, and stamps
    /// the heartbeat, all in one statement so no two workers receive
    /// the same attempt.
    async fn claim_next(&self, worker_id: &str) -> AppResult<Option<Job>>;

    /// Find a job by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// Mark a job completed.
    async fn mark_completed(&self, id: Uuid) -> AppResult<()>;

    /// Archive a job as failed with its final error.
    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()>;

    /// Return a running job to `pending` for a later retry attempt.
    async fn reschedule(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> AppResult<()>;

    /// Record liveness of the worker holding the job.
    async fn heartbeat(&self, id: Uuid) -> AppResult<()>;

    /// Redeliver running jobs whose heartbeat is older than `cutoff`.
    /// Returns the ids of the reaped jobs.
    async fn reap_stalled(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Uuid>>;

    /// Queue depth snapshot by state.
    async fn counts(&self) -> AppResult<QueueCounts>;

    /// Delete old terminal jobs. Returns rows deleted.
    async fn cleanup(
        &self,
        completed_before: DateTime<Utc>,
        failed_before: DateTime<Utc>,
    ) -> AppResult<u64>;
}
