//! Audit orchestrator — the submission-side state machine.
//!
//! Coordinates validation, quota, de-duplication, record creation, and
//! enqueueing. Holds no long-lived record references: the store owns the
//! record once created, and the queue owns the job until a worker claims
//! it.

use std::sync::Arc;

use serde::Deserialize;
use tracing;
use uuid::Uuid;

use audithub_core::result::AppResult;
use audithub_core::types::pagination::{PageRequest, PageResponse};
use audithub_database::store::{AuditFilter, AuditStore, JobStore, UsageStore};
use audithub_entity::audit::{AuditRecord, AuditStatusView, Platform};
use audithub_entity::job::{JobPayload, NewJob};
use audithub_entity::user::PlanTier;

use super::error::SubmitError;

/// Maximum username length accepted for a target.
const MAX_USERNAME_LEN: usize = 50;

/// A validated audit submission.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSubmission {
    /// Target platform.
    pub platform: Platform,
    /// Target username.
    pub username: String,
}

/// Orchestrates the audit lifecycle from submission to enqueue.
///
/// Stores are injected as trait objects so tests can substitute
/// in-memory fakes.
#[derive(Debug, Clone)]
pub struct AuditOrchestrator {
    audits: Arc<dyn AuditStore>,
    usage: Arc<dyn UsageStore>,
    jobs: Arc<dyn JobStore>,
    max_attempts: i32,
}

impl AuditOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        audits: Arc<dyn AuditStore>,
        usage: Arc<dyn UsageStore>,
        jobs: Arc<dyn JobStore>,
        max_attempts: i32,
    ) -> Self {
        Self {
            audits,
            usage,
            jobs,
            max_attempts,
        }
    }

    /// Accept an audit request and enqueue it for processing.
    ///
    /// Returns the created record immediately; the call never blocks on
    /// processing. The quota check and the usage increment are not one
    /// transaction: concurrent submissions near the limit may over-admit
    /// by a small margin, which is accepted best-effort behavior.
    pub async fn submit(
        &self,
        owner_id: Uuid,
        plan: PlanTier,
        submission: AuditSubmission,
    ) -> Result<AuditRecord, SubmitError> {
        validate_username(&submission.username)?;

        if let Some(limit) = plan.monthly_audit_limit() {
            let current = self.usage.audits_this_month(owner_id).await?;
            if current >= limit {
                return Err(SubmitError::QuotaExceeded {
                    current,
                    limit,
                    plan,
                });
            }
        }

        if let Some(existing) = self
            .audits
            .find_active(owner_id, submission.platform, &submission.username)
            .await?
        {
            return Err(SubmitError::AuditInProgress {
                existing_id: existing.id,
            });
        }

        let new_audit = audithub_entity::audit::NewAudit {
            owner_id,
            platform: submission.platform,
            username: submission.username.clone(),
        };
        let record = match self.audits.create(&new_audit).await {
            Ok(record) => record,
            // Lost the creation race against a concurrent submission for
            // the same target: surface the winner's id.
            Err(e) if e.is_conflict() => {
                let existing = self
                    .audits
                    .find_active(owner_id, submission.platform, &submission.username)
                    .await?;
                return match existing {
                    Some(existing) => Err(SubmitError::AuditInProgress {
                        existing_id: existing.id,
                    }),
                    None => Err(SubmitError::Store(e)),
                };
            }
            Err(e) => return Err(SubmitError::Store(e)),
        };

        if let Err(e) = self.usage.increment_audits(owner_id).await {
            // The counter is advisory; a missed increment must not strand
            // the already-created record.
            tracing::warn!(
                "Failed to increment usage counter for user {}: {}",
                owner_id,
                e
            );
        }

        let payload = JobPayload::AuditProcess {
            audit_id: record.id,
            platform: submission.platform,
            username: submission.username.clone(),
            owner_id,
        };
        let job = NewJob {
            job_type: payload.job_type().to_string(),
            priority: plan.queue_priority(),
            payload: serde_json::to_value(&payload).map_err(|e| SubmitError::Store(e.into()))?,
            max_attempts: self.max_attempts,
            scheduled_at: None,
            created_by: Some(owner_id),
        };

        if let Err(e) = self.jobs.create(&job).await {
            tracing::error!(
                "Failed to enqueue audit job for record {}: {}",
                record.id,
                e
            );
            if let Err(fail_err) = self
                .audits
                .mark_failed(record.id, "Failed to queue audit for processing")
                .await
            {
                tracing::error!(
                    "Failed to mark unqueued audit {} as failed: {}",
                    record.id,
                    fail_err
                );
            }
            return Err(SubmitError::QueueUnavailable(e));
        }

        tracing::info!(
            "Audit accepted: id={}, owner={}, platform='{}', username='{}', priority={}",
            record.id,
            owner_id,
            submission.platform,
            submission.username,
            plan.queue_priority()
        );

        Ok(record)
    }

    /// Load a full record, owner-scoped.
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<AuditRecord>> {
        Ok(self
            .audits
            .find_by_id(id)
            .await?
            .filter(|record| record.owner_id == owner_id))
    }

    /// Load the lightweight status projection, owner-scoped.
    pub async fn get_status(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<AuditStatusView>> {
        self.audits.status_view(id, owner_id).await
    }

    /// List the owner's audits, newest first.
    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: AuditFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<AuditRecord>> {
        self.audits.list(owner_id, &filter, &page).await
    }
}

/// Validate the target username: 1–50 characters from `[A-Za-z0-9._-]`.
fn validate_username(username: &str) -> Result<(), SubmitError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(SubmitError::Validation(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(SubmitError::Validation(
            "Username contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use audithub_core::error::AppError;
    use audithub_entity::audit::{
        AuditMetrics, AuditStatus, InfluencerProfile, NewAudit, QualityAnalysis,
    };
    use audithub_entity::job::{Job, JobPriority, JobStatus, QueueCounts};

    #[derive(Debug, Default)]
    struct MemoryAuditStore {
        records: Mutex<HashMap<Uuid, AuditRecord>>,
    }

    fn blank_record(id: Uuid, audit: &NewAudit) -> AuditRecord {
        AuditRecord {
            id,
            owner_id: audit.owner_id,
            influencer: InfluencerProfile {
                platform: audit.platform,
                username: audit.username.clone(),
                display_name: String::new(),
                profile_picture: String::new(),
                bio: String::new(),
                verified: false,
                profile_url: audit.platform.profile_url(&audit.username),
            },
            metrics: AuditMetrics::default(),
            quality_analysis: QualityAnalysis::default(),
            status: AuditStatus::Pending,
            error: None,
            processing_time_ms: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            updated_at: Utc::now(),
        }
    }

    #[async_trait]
    impl AuditStore for MemoryAuditStore {
        async fn create(&self, audit: &NewAudit) -> AppResult<AuditRecord> {
            let mut records = self.records.lock().unwrap();
            let duplicate = records.values().any(|r| {
                r.owner_id == audit.owner_id
                    && r.influencer.platform == audit.platform
                    && r.influencer.username == audit.username
                    && !r.status.is_terminal()
            });
            if duplicate {
                return Err(AppError::conflict("active audit exists"));
            }
            let record = blank_record(Uuid::new_v4(), audit);
            records.insert(record.id, record.clone());
            Ok(record)
        }

        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AuditRecord>> {
            Ok(self.records.lock().unwrap().get(&id).cloned())
        }

        async fn find_active(
            &self,
            owner_id: Uuid,
            platform: Platform,
            username: &str,
        ) -> AppResult<Option<AuditRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .find(|r| {
                    r.owner_id == owner_id
                        && r.influencer.platform == platform
                        && r.influencer.username == username
                        && !r.status.is_terminal()
                })
                .cloned())
        }

        async fn list(
            &self,
            owner_id: Uuid,
            _filter: &AuditFilter,
            page: &PageRequest,
        ) -> AppResult<PageResponse<AuditRecord>> {
            let items: Vec<AuditRecord> = self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.owner_id == owner_id)
                .cloned()
                .collect();
            let total = items.len() as u64;
            Ok(PageResponse::new(items, page.page, page.page_size, total))
        }

        async fn status_view(
            &self,
            id: Uuid,
            owner_id: Uuid,
        ) -> AppResult<Option<AuditStatusView>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .get(&id)
                .filter(|r| r.owner_id == owner_id)
                .map(|r| AuditStatusView {
                    id: r.id,
                    status: r.status,
                    created_at: r.created_at,
                    started_at: r.started_at,
                    completed_at: r.completed_at,
                    error: r.error.clone(),
                }))
        }

        async fn mark_started(&self, id: Uuid) -> AppResult<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found("no record"))?;
            if record.status != AuditStatus::Pending {
                return Err(AppError::conflict("not pending"));
            }
            record.status = AuditStatus::InProgress;
            record.started_at = Some(Utc::now());
            Ok(())
        }

        async fn mark_completed(
            &self,
            id: Uuid,
            _profile: &InfluencerProfile,
            _metrics: &AuditMetrics,
            _quality: &QualityAnalysis,
            _processing_time_ms: i64,
        ) -> AppResult<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found("no record"))?;
            if record.status.is_terminal() {
                return Err(AppError::conflict("already terminal"));
            }
            record.status = AuditStatus::Completed;
            record.completed_at = Some(Utc::now());
            Ok(())
        }

        async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found("no record"))?;
            if record.status.is_terminal() {
                return Err(AppError::conflict("already terminal"));
            }
            record.status = AuditStatus::Failed;
            record.error = Some(error.to_string());
            record.completed_at = Some(Utc::now());
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct MemoryUsageStore {
        counts: Mutex<HashMap<Uuid, i64>>,
    }

    #[async_trait]
    impl UsageStore for MemoryUsageStore {
        async fn audits_this_month(&self, owner_id: Uuid) -> AppResult<i64> {
            Ok(*self.counts.lock().unwrap().get(&owner_id).unwrap_or(&0))
        }

        async fn increment_audits(&self, owner_id: Uuid) -> AppResult<i64> {
            let mut counts = self.counts.lock().unwrap();
            let count = counts.entry(owner_id).or_insert(0);
            *count += 1;
            Ok(*count)
        }

        async fn reset_all(&self) -> AppResult<u64> {
            let mut counts = self.counts.lock().unwrap();
            let affected = counts.len() as u64;
            counts.clear();
            Ok(affected)
        }
    }

    #[derive(Debug, Default)]
    struct MemoryJobStore {
        jobs: Mutex<Vec<Job>>,
        fail_create: AtomicBool,
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn create(&self, job: &NewJob) -> AppResult<Job> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(AppError::service_unavailable("queue backend down"));
            }
            let now = Utc::now();
            let created = Job {
                id: Uuid::new_v4(),
                job_type: job.job_type.clone(),
                priority: job.priority,
                payload: job.payload.clone(),
                error_message: None,
                status: JobStatus::Pending,
                attempts: 0,
                max_attempts: job.max_attempts,
                scheduled_at: job.scheduled_at,
                started_at: None,
                completed_at: None,
                last_heartbeat_at: None,
                worker_id: None,
                created_by: job.created_by,
                created_at: now,
                updated_at: now,
            };
            self.jobs.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn claim_next(&self, _worker_id: &str) -> AppResult<Option<Job>> {
            Ok(None)
        }

        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .find(|j| j.id == id)
                .cloned())
        }

        async fn mark_completed(&self, _id: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn mark_failed(&self, _id: Uuid, _error: &str) -> AppResult<()> {
            Ok(())
        }

        async fn reschedule(
            &self,
            _id: Uuid,
            _run_at: DateTime<Utc>,
            _error: &str,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn heartbeat(&self, _id: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn reap_stalled(&self, _cutoff: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
            Ok(Vec::new())
        }

        async fn counts(&self) -> AppResult<QueueCounts> {
            Ok(QueueCounts::default())
        }

        async fn cleanup(
            &self,
            _completed_before: DateTime<Utc>,
            _failed_before: DateTime<Utc>,
        ) -> AppResult<u64> {
            Ok(0)
        }
    }

    struct Harness {
        orchestrator: AuditOrchestrator,
        audits: Arc<MemoryAuditStore>,
        usage: Arc<MemoryUsageStore>,
        jobs: Arc<MemoryJobStore>,
    }

    fn harness() -> Harness {
        let audits = Arc::new(MemoryAuditStore::default());
        let usage = Arc::new(MemoryUsageStore::default());
        let jobs = Arc::new(MemoryJobStore::default());
        let orchestrator = AuditOrchestrator::new(
            Arc::clone(&audits) as Arc<dyn AuditStore>,
            Arc::clone(&usage) as Arc<dyn UsageStore>,
            Arc::clone(&jobs) as Arc<dyn JobStore>,
            3,
        );
        Harness {
            orchestrator,
            audits,
            usage,
            jobs,
        }
    }

    fn submission(username: &str) -> AuditSubmission {
        AuditSubmission {
            platform: Platform::Instagram,
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn submit_creates_pending_record_and_job() {
        let h = harness();
        let owner = Uuid::new_v4();

        let record = h
            .orchestrator
            .submit(owner, PlanTier::Free, submission("validuser"))
            .await
            .unwrap();

        assert_eq!(record.status, AuditStatus::Pending);
        assert_eq!(record.owner_id, owner);

        let jobs = h.jobs.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_type, "audit_process");
        assert_eq!(jobs[0].priority, JobPriority::Normal);
        assert_eq!(jobs[0].payload["audit_id"], record.id.to_string());
        drop(jobs);

        assert_eq!(h.usage.audits_this_month(owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn premium_plans_enqueue_elevated_priority() {
        let h = harness();
        let owner = Uuid::new_v4();
        h.orchestrator
            .submit(owner, PlanTier::Pro, submission("validuser"))
            .await
            .unwrap();
        let jobs = h.jobs.jobs.lock().unwrap();
        assert_eq!(jobs[0].priority, JobPriority::Elevated);
    }

    #[tokio::test]
    async fn duplicate_active_audit_is_rejected_with_existing_id() {
        let h = harness();
        let owner = Uuid::new_v4();
        let first = h
            .orchestrator
            .submit(owner, PlanTier::Free, submission("validuser"))
            .await
            .unwrap();

        let err = h
            .orchestrator
            .submit(owner, PlanTier::Free, submission("validuser"))
            .await
            .unwrap_err();
        match err {
            SubmitError::AuditInProgress { existing_id } => assert_eq!(existing_id, first.id),
            other => panic!("Expected AuditInProgress, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn quota_at_limit_rejects_without_creating_a_record() {
        let h = harness();
        let owner = Uuid::new_v4();
        for _ in 0..50 {
            h.usage.increment_audits(owner).await.unwrap();
        }

        let err = h
            .orchestrator
            .submit(owner, PlanTier::Free, submission("validuser"))
            .await
            .unwrap_err();
        match err {
            SubmitError::QuotaExceeded {
                current,
                limit,
                plan,
            } => {
                assert_eq!(current, 50);
                assert_eq!(limit, 50);
                assert_eq!(plan, PlanTier::Free);
            }
            other => panic!("Expected QuotaExceeded, got {other:?}"),
        }
        assert!(h.audits.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn enterprise_plan_has_no_quota() {
        let h = harness();
        let owner = Uuid::new_v4();
        for _ in 0..5000 {
            h.usage.increment_audits(owner).await.unwrap();
        }
        h.orchestrator
            .submit(owner, PlanTier::Enterprise, submission("validuser"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn invalid_usernames_are_rejected_before_side_effects() {
        let h = harness();
        let owner = Uuid::new_v4();
        for bad in ["", "has spaces", "emoji🙂", &"x".repeat(51)] {
            let err = h
                .orchestrator
                .submit(owner, PlanTier::Free, submission(bad))
                .await
                .unwrap_err();
            assert!(matches!(err, SubmitError::Validation(_)), "input: {bad:?}");
        }
        assert!(h.audits.records.lock().unwrap().is_empty());
        assert_eq!(h.usage.audits_this_month(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn enqueue_failure_marks_record_failed() {
        let h = harness();
        let owner = Uuid::new_v4();
        h.jobs.fail_create.store(true, Ordering::SeqCst);

        let err = h
            .orchestrator
            .submit(owner, PlanTier::Free, submission("validuser"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::QueueUnavailable(_)));

        let records = h.audits.records.lock().unwrap();
        let record = records.values().next().unwrap();
        assert_eq!(record.status, AuditStatus::Failed);
        assert!(record.error.as_deref().unwrap().contains("queue"));
    }

    #[tokio::test]
    async fn get_is_owner_scoped() {
        let h = harness();
        let owner = Uuid::new_v4();
        let record = h
            .orchestrator
            .submit(owner, PlanTier::Free, submission("validuser"))
            .await
            .unwrap();

        assert!(
            h.orchestrator
                .get(owner, record.id)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            h.orchestrator
                .get(Uuid::new_v4(), record.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
