//! Job repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use audithub_core::error::{AppError, ErrorKind};
use audithub_core::result::AppResult;
use audithub_entity::job::{Job, NewJob, QueueCounts};

use crate::store::JobStore;

/// Repository for durable queue operations.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn create(&self, job: &NewJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (job_type, priority, payload, max_attempts, scheduled_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&job.job_type)
        .bind(job.priority)
        .bind(&job.payload)
        .bind(job.max_attempts)
        .bind(job.scheduled_at)
        .bind(job.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    /// Claim the next dispatchable job (`SKIP LOCKED` for concurrency).
    async fn claim_next(&self, worker_id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', started_at = NOW(), \
             last_heartbeat_at = NOW(), worker_id = $1, \
             attempts = attempts + 1, updated_at = NOW() \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE status = 'pending' \
                AND (scheduled_at IS NULL OR scheduled_at <= NOW()) \
                ORDER BY \
                    CASE priority WHEN 'elevated' THEN 0 ELSE 1 END, \
                    created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    async fn mark_completed(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = $2, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark job as failed", e))?;
        Ok(())
    }

    async fn reschedule(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'pending', scheduled_at = $2, error_message = $3, \
             worker_id = NULL, last_heartbeat_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .bind(run_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reschedule job", e))?;
        Ok(())
    }

    async fn heartbeat(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET last_heartbeat_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to heartbeat job", e))?;
        Ok(())
    }

    async fn reap_stalled(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "UPDATE jobs SET status = 'pending', worker_id = NULL, \
             last_heartbeat_at = NULL, updated_at = NOW() \
             WHERE status = 'running' AND last_heartbeat_at < $1 \
             RETURNING id",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reap stalled jobs", e))?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn counts(&self) -> AppResult<QueueCounts> {
        let row: (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
             COUNT(*) FILTER (WHERE status = 'pending'), \
             COUNT(*) FILTER (WHERE status = 'running'), \
             COUNT(*) FILTER (WHERE status = 'completed'), \
             COUNT(*) FILTER (WHERE status = 'failed') \
             FROM jobs",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))?;

        Ok(QueueCounts {
            waiting: row.0,
            active: row.1,
            completed: row.2,
            failed: row.3,
        })
    }

    async fn cleanup(
        &self,
        completed_before: DateTime<Utc>,
        failed_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM jobs WHERE \
             (status = 'completed' AND completed_at < $1) OR \
             (status = 'failed' AND completed_at < $2)",
        )
        .bind(completed_before)
        .bind(failed_before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cleanup jobs", e))?;

        Ok(result.rows_affected())
    }
}
