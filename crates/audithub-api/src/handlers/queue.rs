//! Queue statistics endpoint (admin only).

use axum::Json;
use axum::extract::State;

use audithub_core::error::AppError;

use crate::dto::response::{ApiResponse, QueueStatsResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/admin/queue/stats — queue depth snapshot.
pub async fn queue_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<QueueStatsResponse>>, ApiError> {
    if !auth.role.is_admin() {
        return Err(AppError::authorization("Queue statistics require the admin role").into());
    }

    let stats = state.job_queue.stats().await?;
    Ok(Json(ApiResponse::ok(QueueStatsResponse { stats })))
}
