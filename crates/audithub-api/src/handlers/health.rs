//! Liveness endpoint.

use axum::Json;

use crate::dto::response::HealthResponse;

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
