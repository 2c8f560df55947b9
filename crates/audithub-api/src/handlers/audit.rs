//! Audit endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing;
use uuid::Uuid;
use validator::Validate;

use audithub_core::error::AppError;
use audithub_core::types::pagination::PageRequest;
use audithub_database::store::AuditFilter;
use audithub_service::audit::{AuditSubmission, SubmitError};

use crate::dto::request::{CreateAuditRequest, ListAuditsParams};
use crate::dto::response::{ApiResponse, AuditAcceptedResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/audits — accept a new audit (asynchronous processing).
pub async fn create_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateAuditRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuditAcceptedResponse>>), ApiError> {
    req.validate()
        .map_err(|e| SubmitError::Validation(e.to_string()))?;

    tracing::info!(
        "New audit request: user={}, platform='{}', username='{}'",
        auth.user_id,
        req.platform,
        req.username
    );

    let record = state
        .orchestrator
        .submit(
            auth.user_id,
            auth.plan,
            AuditSubmission {
                platform: req.platform,
                username: req.username,
            },
        )
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(AuditAcceptedResponse::from(&record))),
    ))
}

/// GET /api/audits/{id} — full record, owner-scoped.
pub async fn get_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state
        .orchestrator
        .get(auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Audit not found"))?;

    Ok(Json(serde_json::json!({ "success": true, "data": record })))
}

/// GET /api/audits/{id}/status — lightweight status projection.
pub async fn get_audit_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = state
        .orchestrator
        .get_status(auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Audit not found"))?;

    Ok(Json(serde_json::json!({ "success": true, "data": status })))
}

/// GET /api/audits — paginated list, owner-scoped.
pub async fn list_audits(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListAuditsParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = PageRequest::new(params.page.unwrap_or(1), params.limit.unwrap_or(10));
    let filter = AuditFilter {
        platform: params.platform,
        status: params.status,
    };

    let result = state.orchestrator.list(auth.user_id, filter, page).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": result })))
}
