//! Submission-path error taxonomy.

use thiserror::Error;
use uuid::Uuid;

use audithub_core::error::AppError;
use audithub_entity::user::PlanTier;

/// Errors returned synchronously from [`super::AuditOrchestrator::submit`].
///
/// Processing-time errors never appear here: the submitter has already
/// received its accepted response, and failures are only observable by
/// polling the record.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Malformed input, rejected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The caller's monthly quota is exhausted.
    #[error("Monthly audit limit reached ({current}/{limit}) for plan '{plan}'")]
    QuotaExceeded {
        /// Audits used this month.
        current: i64,
        /// Plan limit.
        limit: i64,
        /// The caller's plan tier.
        plan: PlanTier,
    },

    /// An active audit already exists for this target.
    #[error("An audit is already in progress for this profile")]
    AuditInProgress {
        /// Id of the existing active record; poll it instead.
        existing_id: Uuid,
    },

    /// The record was created but could not be enqueued; it has been
    /// force-transitioned to `failed`.
    #[error("Failed to queue audit for processing")]
    QueueUnavailable(#[source] AppError),

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] AppError),
}
