//! Job queue abstraction over the durable job store.
//!
//! At-least-once delivery: a claimed job that is never acknowledged is
//! redelivered after the stall timeout, so downstream record writes are
//! CAS-protected and replays are swallowed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing;
use uuid::Uuid;

use audithub_core::error::AppError;
use audithub_database::store::JobStore;
use audithub_entity::job::{Job, JobPayload, JobPriority, NewJob, QueueCounts};

use crate::events::{JobEvent, JobOutcome};

/// Capacity of the job event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Retry policy applied to failed delivery attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum delivery attempts per job.
    pub max_attempts: i32,
    /// Base delay for exponential backoff.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Backoff delay before the attempt following `failed_attempt`:
    /// `base × 2^(failed_attempt − 1)`.
    pub fn backoff_delay(&self, failed_attempt: i32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).clamp(0, 16) as u32;
        self.backoff_base * 2u32.pow(exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

/// What the queue decided to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The job was rescheduled; it will run again after the delay.
    Rescheduled(Duration),
    /// Attempts were exhausted; the job was archived as failed.
    Archived,
}

/// Job queue for enqueuing and claiming work.
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Durable job store.
    store: Arc<dyn JobStore>,
    /// Worker identifier for claiming jobs.
    worker_id: String,
    /// Retry policy.
    retry: RetryPolicy,
    /// Outcome event channel.
    events: broadcast::Sender<JobEvent>,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(store: Arc<dyn JobStore>, worker_id: String, retry: RetryPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            worker_id,
            retry,
            events,
        }
    }

    /// Subscribe to job outcome events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Enqueue a typed payload.
    pub async fn enqueue(
        &self,
        payload: &JobPayload,
        priority: JobPriority,
        created_by: Option<Uuid>,
    ) -> Result<Job, AppError> {
        let job = NewJob {
            job_type: payload.job_type().to_string(),
            priority,
            payload: serde_json::to_value(payload)?,
            max_attempts: self.retry.max_attempts,
            scheduled_at: None,
            created_by,
        };
        let job = self.store.create(&job).await?;

        tracing::debug!(
            "Enqueued job: id={}, type='{}', priority={}",
            job.id,
            job.job_type,
            job.priority
        );
        Ok(job)
    }

    /// Claim the next available job for this worker, if any.
    pub async fn dequeue(&self) -> Result<Option<Job>, AppError> {
        let job = self.store.claim_next(&self.worker_id).await?;
        if let Some(job) = &job {
            tracing::debug!(
                "Claimed job: id={}, type='{}', attempt={}/{}",
                job.id,
                job.job_type,
                job.attempts,
                job.max_attempts
            );
        }
        Ok(job)
    }

    /// Acknowledge a job as completed successfully.
    pub async fn complete(&self, job: &Job) -> Result<(), AppError> {
        self.store.mark_completed(job.id).await?;
        self.publish(job, JobOutcome::Completed);
        tracing::debug!("Job completed: id={}", job.id);
        Ok(())
    }

    /// Archive a job as failed without further attempts.
    pub async fn fail(&self, job: &Job, error: &str) -> Result<(), AppError> {
        self.store.mark_failed(job.id, error).await?;
        self.publish(job, JobOutcome::Failed);
        tracing::debug!("Job failed permanently: id={}, error='{}'", job.id, error);
        Ok(())
    }

    /// Handle a failed attempt: reschedule with exponential backoff while
    /// attempts remain, otherwise archive as failed.
    pub async fn retry_or_fail(&self, job: &Job, error: &str) -> Result<RetryDecision, AppError> {
        if job.can_retry() {
            let delay = self.retry.backoff_delay(job.attempts);
            let run_at = Utc::now()
                + chrono::Duration::from_std(delay)
                    .unwrap_or_else(|_| chrono::Duration::seconds(2));
            self.store.reschedule(job.id, run_at, error).await?;
            self.publish(
                job,
                JobOutcome::Retried {
                    attempt: job.attempts,
                },
            );
            tracing::info!(
                "Job rescheduled: id={}, attempt={}/{}, retry in {:?}",
                job.id,
                job.attempts,
                job.max_attempts,
                delay
            );
            Ok(RetryDecision::Rescheduled(delay))
        } else {
            self.store.mark_failed(job.id, error).await?;
            self.publish(job, JobOutcome::Failed);
            tracing::warn!(
                "Job exhausted its {} attempts and was archived: id={}, error='{}'",
                job.max_attempts,
                job.id,
                error
            );
            Ok(RetryDecision::Archived)
        }
    }

    /// Record liveness of the worker holding a job.
    pub async fn heartbeat(&self, job_id: Uuid) -> Result<(), AppError> {
        self.store.heartbeat(job_id).await
    }

    /// Requeue running jobs whose heartbeat is older than `cutoff`.
    pub async fn reap_stalled(&self, cutoff: DateTime<Utc>) -> Result<usize, AppError> {
        let reaped = self.store.reap_stalled(cutoff).await?;
        for job_id in &reaped {
            tracing::warn!("Stalled job redelivered: id={}", job_id);
            // Payload not reloaded for stall events; subscribers that need
            // it can look the job up.
            let _ = self.events.send(JobEvent {
                job_id: *job_id,
                job_type: String::new(),
                payload: serde_json::Value::Null,
                outcome: JobOutcome::Stalled,
            });
        }
        Ok(reaped.len())
    }

    /// Read-only queue depth snapshot.
    pub async fn stats(&self) -> Result<QueueCounts, AppError> {
        self.store.counts().await
    }

    /// Delete old terminal jobs per the archival policy: completed jobs
    /// after 24 hours, failed jobs after 7 days.
    pub async fn cleanup(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        self.store
            .cleanup(now - chrono::Duration::hours(24), now - chrono::Duration::days(7))
            .await
    }

    fn publish(&self, job: &Job, outcome: JobOutcome) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.events.send(JobEvent {
            job_id: job.id,
            job_type: job.job_type.clone(),
            payload: job.payload.clone(),
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use audithub_core::result::AppResult;
    use audithub_entity::audit::Platform;
    use audithub_entity::job::JobStatus;

    /// In-memory job store mirroring the Postgres claim semantics.
    #[derive(Debug, Default)]
    struct MemoryJobStore {
        jobs: Mutex<HashMap<Uuid, Job>>,
    }

    impl MemoryJobStore {
        fn insert(&self, job: Job) {
            self.jobs.lock().unwrap().insert(job.id, job);
        }

        fn get(&self, id: Uuid) -> Job {
            self.jobs.lock().unwrap().get(&id).unwrap().clone()
        }
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn create(&self, job: &NewJob) -> AppResult<Job> {
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
            self.insert(created.clone());
            Ok(created)
        }

        async fn claim_next(&self, worker_id: &str) -> AppResult<Option<Job>> {
            let mut jobs = self.jobs.lock().unwrap();
            let now = Utc::now();
            let next = jobs
                .values()
                .filter(|j| {
                    j.status == JobStatus::Pending
                        && j.scheduled_at.is_none_or(|at| at <= now)
                })
                .min_by_key(|j| {
                    let class = match j.priority {
                        JobPriority::Elevated => 0,
                        JobPriority::Normal => 1,
                    };
                    (class, j.created_at)
                })
                .map(|j| j.id);

            Ok(next.map(|id| {
                let job = jobs.get_mut(&id).unwrap();
                job.status = JobStatus::Running;
                job.attempts += 1;
                job.started_at = Some(now);
                job.last_heartbeat_at = Some(now);
                job.worker_id = Some(worker_id.to_string());
                job.clone()
            }))
        }

        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(&id).cloned())
        }

        async fn mark_completed(&self, id: Uuid) -> AppResult<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.get_mut(&id) {
                job.status = JobStatus::Completed;
                job.completed_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.get_mut(&id) {
                job.status = JobStatus::Failed;
                job.error_message = Some(error.to_string());
                job.completed_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn reschedule(
            &self,
            id: Uuid,
            run_at: DateTime<Utc>,
            error: &str,
        ) -> AppResult<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.get_mut(&id) {
                job.status = JobStatus::Pending;
                job.scheduled_at = Some(run_at);
                job.error_message = Some(error.to_string());
                job.worker_id = None;
                job.last_heartbeat_at = None;
            }
            Ok(())
        }

        async fn heartbeat(&self, id: Uuid) -> AppResult<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.get_mut(&id) {
                job.last_heartbeat_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn reap_stalled(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
            let mut jobs = self.jobs.lock().unwrap();
            let mut reaped = Vec::new();
            for job in jobs.values_mut() {
                if job.status == JobStatus::Running
                    && job.last_heartbeat_at.is_some_and(|hb| hb < cutoff)
                {
                    job.status = JobStatus::Pending;
                    job.worker_id = None;
                    job.last_heartbeat_at = None;
                    reaped.push(job.id);
                }
            }
            Ok(reaped)
        }

        async fn counts(&self) -> AppResult<QueueCounts> {
            let jobs = self.jobs.lock().unwrap();
            let mut counts = QueueCounts::default();
            for job in jobs.values() {
                match job.status {
                    JobStatus::Pending => counts.waiting += 1,
                    JobStatus::Running => counts.active += 1,
                    JobStatus::Completed => counts.completed += 1,
                    JobStatus::Failed => counts.failed += 1,
                }
            }
            Ok(counts)
        }

        async fn cleanup(
            &self,
            completed_before: DateTime<Utc>,
            failed_before: DateTime<Utc>,
        ) -> AppResult<u64> {
            let mut jobs = self.jobs.lock().unwrap();
            let before = jobs.len();
            jobs.retain(|_, job| match job.status {
                JobStatus::Completed => !job.completed_at.is_some_and(|at| at < completed_before),
                JobStatus::Failed => !job.completed_at.is_some_and(|at| at < failed_before),
                _ => true,
            });
            Ok((before - jobs.len()) as u64)
        }
    }

    fn queue_with_store() -> (JobQueue, Arc<MemoryJobStore>) {
        let store = Arc::new(MemoryJobStore::default());
        let queue = JobQueue::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            "worker-test".to_string(),
            RetryPolicy::default(),
        );
        (queue, store)
    }

    fn seeded_job(priority: JobPriority, created_at: DateTime<Utc>, label: &str) -> Job {
        Job {
            id: Uuid::new_v4(),
            job_type: "audit_process".to_string(),
            priority,
            payload: serde_json::json!({ "label": label }),
            error_message: None,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: 3,
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            last_heartbeat_at: None,
            worker_id: None,
            created_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn dispatch_order_is_priority_then_fifo() {
        let (queue, store) = queue_with_store();
        let t0 = Utc::now();
        let a = seeded_job(JobPriority::Elevated, t0 + chrono::Duration::seconds(1), "a");
        let b = seeded_job(JobPriority::Normal, t0, "b");
        let c = seeded_job(JobPriority::Elevated, t0 + chrono::Duration::seconds(2), "c");
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        store.insert(a);
        store.insert(b);
        store.insert(c);

        let first = queue.dequeue().await.unwrap().unwrap();
        let second = queue.dequeue().await.unwrap().unwrap();
        let third = queue.dequeue().await.unwrap().unwrap();
        assert_eq!([first.id, second.id, third.id], [a_id, c_id, b_id]);
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_two_claims_of_the_same_attempt() {
        let (queue, store) = queue_with_store();
        store.insert(seeded_job(JobPriority::Normal, Utc::now(), "only"));

        let first = queue.dequeue().await.unwrap();
        let second = queue.dequeue().await.unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn backoff_delays_strictly_increase() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn failed_attempts_reschedule_until_exhausted() {
        let (queue, store) = queue_with_store();
        let payload = JobPayload::QueueCleanup;
        let job = queue
            .enqueue(&payload, JobPriority::Normal, None)
            .await
            .unwrap();

        let mut delays = Vec::new();
        for expected_attempt in 1..=3 {
            // Make the backoff window elapse immediately so dequeue sees it.
            {
                let mut jobs = store.jobs.lock().unwrap();
                jobs.get_mut(&job.id).unwrap().scheduled_at = None;
            }
            let claimed = queue.dequeue().await.unwrap().unwrap();
            assert_eq!(claimed.attempts, expected_attempt);

            match queue.retry_or_fail(&claimed, "boom").await.unwrap() {
                RetryDecision::Rescheduled(delay) => delays.push(delay),
                RetryDecision::Archived => assert_eq!(expected_attempt, 3),
            }
        }

        assert_eq!(delays, vec![Duration::from_secs(2), Duration::from_secs(4)]);
        let archived = store.get(job.id);
        assert_eq!(archived.status, JobStatus::Failed);
        assert_eq!(archived.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn stalled_jobs_are_redelivered() {
        let (queue, store) = queue_with_store();
        store.insert(seeded_job(JobPriority::Normal, Utc::now(), "stall"));

        let claimed = queue.dequeue().await.unwrap().unwrap();
        // Nothing heartbeats; everything claimed before a future cutoff
        // counts as stalled.
        let reaped = queue
            .reap_stalled(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(reaped, 1);

        let redelivered = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(redelivered.id, claimed.id);
        assert_eq!(redelivered.attempts, 2);
    }

    #[tokio::test]
    async fn events_are_published_for_outcomes() {
        let (queue, _store) = queue_with_store();
        let mut events = queue.subscribe();

        let payload = JobPayload::QueueCleanup;
        queue
            .enqueue(&payload, JobPriority::Normal, None)
            .await
            .unwrap();
        let claimed = queue.dequeue().await.unwrap().unwrap();
        queue.complete(&claimed).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.job_id, claimed.id);
        assert_eq!(event.outcome, JobOutcome::Completed);
    }

    #[tokio::test]
    async fn stats_reflect_job_states() {
        let (queue, store) = queue_with_store();
        store.insert(seeded_job(JobPriority::Normal, Utc::now(), "w1"));
        store.insert(seeded_job(JobPriority::Normal, Utc::now(), "w2"));
        let claimed = queue.dequeue().await.unwrap().unwrap();
        queue.complete(&claimed).await.unwrap();

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.waiting, 1);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn enqueue_serializes_typed_payload() {
        let (queue, _store) = queue_with_store();
        let payload = JobPayload::AuditProcess {
            audit_id: Uuid::new_v4(),
            platform: Platform::Tiktok,
            username: "user2".to_string(),
            owner_id: Uuid::new_v4(),
        };
        let job = queue
            .enqueue(&payload, JobPriority::Elevated, None)
            .await
            .unwrap();
        assert_eq!(job.job_type, "audit_process");
        assert_eq!(job.payload["username"], "user2");
    }
}
