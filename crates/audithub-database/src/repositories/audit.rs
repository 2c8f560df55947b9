//! Audit record repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use audithub_core::error::{AppError, ErrorKind};
use audithub_core::result::AppResult;
use audithub_core::types::pagination::{PageRequest, PageResponse};
use audithub_entity::audit::{
    AuditMetrics, AuditRecord, AuditStatusView, InfluencerProfile, NewAudit, Platform,
    QualityAnalysis,
};

use crate::store::{AuditFilter, AuditStore};

/// Repository for audit record CRUD and status transitions.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Create a new audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn create(&self, audit: &NewAudit) -> AppResult<AuditRecord> {
        let quality = serde_json::to_value(QualityAnalysis::default())?;
        let profile_url = audit.platform.profile_url(&audit.username);

        sqlx::query_as::<_, AuditRecord>(
            "INSERT INTO audits (owner_id, platform, username, profile_url, quality_analysis) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(audit.owner_id)
        .bind(audit.platform)
        .bind(&audit.username)
        .bind(&profile_url)
        .bind(&quality)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // The partial unique index on active audits fires when two
            // submissions race past the find_active pre-check.
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(
                "An audit for this profile is already in progress",
            ),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create audit", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AuditRecord>> {
        sqlx::query_as::<_, AuditRecord>("SELECT * FROM audits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find audit", e))
    }

    async fn find_active(
        &self,
        owner_id: Uuid,
        platform: Platform,
        username: &str,
    ) -> AppResult<Option<AuditRecord>> {
        sqlx::query_as::<_, AuditRecord>(
            "SELECT * FROM audits \
             WHERE owner_id = $1 AND platform = $2 AND username = $3 \
             AND status IN ('pending', 'in_progress') \
             LIMIT 1",
        )
        .bind(owner_id)
        .bind(platform)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find active audit", e))
    }

    async fn list(
        &self,
        owner_id: Uuid,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditRecord>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audits \
             WHERE owner_id = $1 \
             AND ($2::platform IS NULL OR platform = $2) \
             AND ($3::audit_status IS NULL OR status = $3)",
        )
        .bind(owner_id)
        .bind(filter.platform)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count audits", e))?;

        let audits = sqlx::query_as::<_, AuditRecord>(
            "SELECT * FROM audits \
             WHERE owner_id = $1 \
             AND ($2::platform IS NULL OR platform = $2) \
             AND ($3::audit_status IS NULL OR status = $3) \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        )
        .bind(owner_id)
        .bind(filter.platform)
        .bind(filter.status)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list audits", e))?;

        Ok(PageResponse::new(
            audits,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn status_view(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<AuditStatusView>> {
        sqlx::query_as::<_, AuditStatusView>(
            "SELECT id, status, created_at, started_at, completed_at, error \
             FROM audits WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load audit status", e))
    }

    async fn mark_started(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE audits SET status = 'in_progress', started_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to start audit", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Audit {id} is not pending; start transition skipped"
            )));
        }
        Ok(())
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        profile: &InfluencerProfile,
        metrics: &AuditMetrics,
        quality: &QualityAnalysis,
        processing_time_ms: i64,
    ) -> AppResult<()> {
        let quality_json = serde_json::to_value(quality)?;

        let result = sqlx::query(
            "UPDATE audits SET status = 'completed', \
             display_name = $2, profile_picture = $3, bio = $4, verified = $5, \
             followers = $6, following = $7, posts_count = $8, \
             avg_likes = $9, avg_comments = $10, engagement_rate = $11, \
             quality_analysis = $12, processing_time_ms = $13, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('completed', 'failed')",
        )
        .bind(id)
        .bind(&profile.display_name)
        .bind(&profile.profile_picture)
        .bind(&profile.bio)
        .bind(profile.verified)
        .bind(metrics.followers)
        .bind(metrics.following)
        .bind(metrics.posts_count)
        .bind(metrics.avg_likes)
        .bind(metrics.avg_comments)
        .bind(metrics.engagement_rate)
        .bind(&quality_json)
        .bind(processing_time_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete audit", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Audit {id} is already terminal; complete transition skipped"
            )));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE audits SET status = 'failed', error = $2, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('completed', 'failed')",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fail audit", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Audit {id} is already terminal; fail transition skipped"
            )));
        }
        Ok(())
    }
}
