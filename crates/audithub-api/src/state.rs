//! Application state shared across all handlers.

use std::sync::Arc;

use audithub_core::config::AppConfig;
use audithub_service::audit::AuditOrchestrator;
use audithub_worker::queue::JobQueue;

use crate::extractors::auth::TokenVerifier;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Bearer-token verifier.
    pub token_verifier: Arc<TokenVerifier>,
    /// Audit orchestrator (submission and read paths).
    pub orchestrator: Arc<AuditOrchestrator>,
    /// Job queue (admin statistics).
    pub job_queue: Arc<JobQueue>,
}
