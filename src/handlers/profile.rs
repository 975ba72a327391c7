//! Profile handlers
//!
//! `/api/profiles/me` only needs a verified session, so a new member can
//! create their profile before any other route accepts them.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::{AuthenticatedUser, SessionUser};
use crate::error::ApiError;
use crate::models::{ApiResponse, Profile, UpsertProfileRequest};
use crate::state::AppState;

/// GET /api/profiles/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state.profile_service.get_profile(session.user_id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/profiles/me
pub async fn upsert_my_profile(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Json(mut request): Json<UpsertProfileRequest>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    if request.email.is_none() {
        request.email = session.email.clone();
    }
    request.validate()?;

    let profile = state
        .profile_service
        .upsert_profile(session.user_id, request)
        .await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// GET /api/profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state.profile_service.get_profile(id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
