//! Completion notifier contract.
//!
//! Notifications are fire-and-forget: failures are logged and never
//! surfaced to the pipeline. Delivery transports (email, webhooks) are
//! external integrations behind this trait.

use async_trait::async_trait;
use tracing;
use uuid::Uuid;

use audithub_core::result::AppResult;
use audithub_entity::audit::AuditRecord;

/// Best-effort notifier for audit outcomes.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Tell the owner their audit report is ready.
    async fn report_ready(&self, owner_id: Uuid, record: &AuditRecord) -> AppResult<()>;
}

/// Notifier that only logs. Used when no delivery transport is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn report_ready(&self, owner_id: Uuid, record: &AuditRecord) -> AppResult<()> {
        tracing::info!(
            "Audit report ready: owner={}, audit={}, target='{}@{}', overall_score={}",
            owner_id,
            record.id,
            record.influencer.username,
            record.influencer.platform,
            record.quality_analysis.overall_score
        );
        Ok(())
    }
}
