//! Upload reservation handler

use axum::{extract::State, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::storage::{ReserveUploadRequest, UploadSlot};

/// POST /api/storage/product-images
pub async fn reserve_product_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ReserveUploadRequest>,
) -> Result<Json<ApiResponse<UploadSlot>>, ApiError> {
    request.validate()?;

    let slot = state
        .storage_service
        .reserve_product_image(user.user_id, &request.file_name)?;
    Ok(Json(ApiResponse::ok(slot)))
}
