//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use audithub_core::error::{AppError, ErrorKind};
use audithub_service::audit::SubmitError;

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// HTTP-facing error: a status code plus the standard error body.
///
/// Domain errors convert into this via `From`, so handlers can use `?`
/// on both `AppError` and `SubmitError` results.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

impl ApiError {
    /// Create an error response.
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse {
                error: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Attach machine-readable details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.body.details = Some(details);
        self
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let (status, code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::Quota => (StatusCode::FORBIDDEN, "AUDIT_LIMIT_REACHED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            _ => {
                tracing::error!(error = %err.message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        Self::new(status, code, err.message)
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match &err {
            SubmitError::Validation(_) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
            }
            SubmitError::QuotaExceeded {
                current,
                limit,
                plan,
            } => Self::new(
                StatusCode::FORBIDDEN,
                "AUDIT_LIMIT_REACHED",
                err.to_string(),
            )
            .with_details(serde_json::json!({
                "current": current,
                "limit": limit,
                "plan": plan,
            })),
            SubmitError::AuditInProgress { existing_id } => Self::new(
                StatusCode::CONFLICT,
                "AUDIT_IN_PROGRESS",
                err.to_string(),
            )
            .with_details(serde_json::json!({ "audit_id": existing_id })),
            SubmitError::QueueUnavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "QUEUE_ERROR",
                err.to_string(),
            ),
            SubmitError::Store(inner) => Self::from(inner.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
