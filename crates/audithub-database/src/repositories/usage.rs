//! Per-user usage counter repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use audithub_core::error::{AppError, ErrorKind};
use audithub_core::result::AppResult;

use crate::store::UsageStore;

/// Repository for monthly audit usage counters.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: PgPool,
}

impl UsageRepository {
    /// Create a new usage repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for UsageRepository {
    async fn audits_this_month(&self, owner_id: Uuid) -> AppResult<i64> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT audits_this_month FROM usage_counters WHERE user_id = $1")
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read usage counter", e)
                })?;

        Ok(count.unwrap_or(0))
    }

    /// Single-statement upsert keeps the quota race window small.
    async fn increment_audits(&self, owner_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "INSERT INTO usage_counters (user_id, audits_this_month) VALUES ($1, 1) \
             ON CONFLICT (user_id) DO UPDATE \
             SET audits_this_month = usage_counters.audits_this_month + 1, updated_at = NOW() \
             RETURNING audits_this_month",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to increment usage counter", e)
        })
    }

    async fn reset_all(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE usage_counters SET audits_this_month = 0, reset_at = NOW(), updated_at = NOW() \
             WHERE audits_this_month > 0",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reset usage counters", e)
        })?;

        Ok(result.rows_affected())
    }
}
