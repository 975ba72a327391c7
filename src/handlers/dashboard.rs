use axum::{extract::State, Json};

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::services::DashboardSummary;
use crate::state::AppState;

/// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let summary = state.dashboard_service.summary(&user.actor()).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
