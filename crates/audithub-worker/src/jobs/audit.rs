//! Audit processing job handler — the worker side of the audit state
//! machine.
//!
//! Drives one delivery attempt: load the record, transition it to
//! `in_progress`, collect the profile, score it, and write the terminal
//! state. The record stays `in_progress` across retry attempts and is
//! marked `failed` exactly once, when the final attempt gives up.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing;

use audithub_collector::error::CollectionError;
use audithub_collector::registry::CollectorRegistry;
use audithub_database::store::AuditStore;
use audithub_entity::audit::{InfluencerProfile, Platform};
use audithub_entity::job::{Job, JobPayload};
use audithub_service::audit::score;

use crate::executor::{JobExecutionError, JobHandler};

/// Handles `audit_process` jobs.
#[derive(Debug)]
pub struct AuditJobHandler {
    /// Audit record store.
    audits: Arc<dyn AuditStore>,
    /// Per-platform collector registry.
    collectors: Arc<CollectorRegistry>,
}

impl AuditJobHandler {
    /// Create a new audit job handler.
    pub fn new(audits: Arc<dyn AuditStore>, collectors: Arc<CollectorRegistry>) -> Self {
        Self { audits, collectors }
    }

    /// Mark the record failed if this is the job's final attempt.
    ///
    /// Earlier attempts leave the record `in_progress`; a conflict means
    /// another writer already settled it, which is fine under
    /// at-least-once delivery.
    async fn settle_failure(&self, job: &Job, audit_id: uuid::Uuid, error: &str) {
        if !job.is_final_attempt() {
            return;
        }
        if let Err(e) = self.audits.mark_failed(audit_id, error).await {
            if e.is_conflict() {
                tracing::debug!("Audit {} already terminal; fail replay ignored", audit_id);
            } else {
                tracing::error!("Failed to mark audit {} as failed: {}", audit_id, e);
            }
        }
    }
}

#[async_trait]
impl JobHandler for AuditJobHandler {
    fn job_type(&self) -> &str {
        "audit_process"
    }

    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let payload: JobPayload = serde_json::from_value(job.payload.clone())
            .map_err(|e| JobExecutionError::Permanent(format!("Invalid job payload: {e}")))?;

        let JobPayload::AuditProcess {
            audit_id,
            platform,
            username,
            owner_id,
        } = payload
        else {
            return Err(JobExecutionError::Permanent(format!(
                "Payload does not match job type '{}'",
                job.job_type
            )));
        };

        tracing::info!(
            "Starting audit processing: audit={}, owner={}, platform='{}', username='{}'",
            audit_id,
            owner_id,
            platform,
            username
        );

        let record = match self.audits.find_by_id(audit_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Not retryable: the referenced record is gone.
                return Err(JobExecutionError::Permanent(format!(
                    "Audit record not found: {audit_id}"
                )));
            }
            Err(e) => {
                self.settle_failure(job, audit_id, "Internal error while loading audit")
                    .await;
                return Err(JobExecutionError::Internal(e));
            }
        };

        // Redelivery after a completed write: acknowledge without work.
        if record.status.is_terminal() {
            tracing::debug!(
                "Audit {} already terminal ({}); acknowledging redelivery",
                audit_id,
                record.status
            );
            return Ok(());
        }

        match self.audits.mark_started(audit_id).await {
            Ok(()) => {}
            // On retry attempts the record is already in_progress.
            Err(e) if e.is_conflict() => {
                tracing::debug!("Audit {} already started; continuing", audit_id);
            }
            Err(e) => {
                self.settle_failure(job, audit_id, "Internal error while starting audit")
                    .await;
                return Err(JobExecutionError::Internal(e));
            }
        }

        let started = Instant::now();

        let (profile, posts) = match self.collectors.collect(platform, &username).await {
            Ok(collected) => collected,
            Err(CollectionError::Unsupported(platform)) => {
                let message = unsupported_message(platform);
                if let Err(e) = self.audits.mark_failed(audit_id, &message).await {
                    if !e.is_conflict() {
                        tracing::error!("Failed to mark audit {} as failed: {}", audit_id, e);
                    }
                }
                return Err(JobExecutionError::Permanent(message));
            }
            Err(collection_err) => {
                let message = collection_err.to_string();
                tracing::warn!(
                    "Profile collection failed for audit {} (attempt {}/{}): {}",
                    audit_id,
                    job.attempts,
                    job.max_attempts,
                    message
                );
                self.settle_failure(job, audit_id, &message).await;
                return Err(JobExecutionError::Transient(message));
            }
        };

        let metrics = score::compute_metrics(&profile, &posts);
        let quality = score::analyze_quality(&profile, &metrics, &posts);

        let influencer = InfluencerProfile {
            platform,
            username: username.clone(),
            display_name: profile.display_name,
            profile_picture: profile.profile_picture,
            bio: profile.bio,
            verified: profile.verified,
            profile_url: platform.profile_url(&username),
        };

        let processing_time_ms = started.elapsed().as_millis() as i64;

        match self
            .audits
            .mark_completed(audit_id, &influencer, &metrics, &quality, processing_time_ms)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    "Audit completed: id={}, overall_score={}, flags={}, took={}ms",
                    audit_id,
                    quality.overall_score,
                    quality.red_flags.len(),
                    processing_time_ms
                );
                Ok(())
            }
            // Lost the terminal write to a concurrent delivery; the
            // record holds a valid result either way.
            Err(e) if e.is_conflict() => {
                tracing::debug!("Audit {} completed by another delivery", audit_id);
                Ok(())
            }
            Err(e) => {
                self.settle_failure(job, audit_id, "Internal error while saving results")
                    .await;
                Err(JobExecutionError::Internal(e))
            }
        }
    }
}

/// Failure reason recorded when no collector serves the platform.
fn unsupported_message(platform: Platform) -> String {
    format!("Unsupported platform: {platform}")
}
