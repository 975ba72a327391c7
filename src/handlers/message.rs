//! Messaging handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::messaging::{Message, SendMessageRequest, UnreadCount};
use crate::models::{ApiResponse, PaginationParams, Profile};
use crate::state::AppState;

/// POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), ApiError> {
    request.validate()?;

    let message = state
        .message_service
        .send_message(&user.actor(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}

/// GET /api/messages
pub async fn inbox(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state.message_service.inbox(&user.actor(), page).await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// GET /api/messages/sent
pub async fn sent_messages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state.message_service.sent(&user.actor(), page).await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// GET /api/messages/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<UnreadCount>>, ApiError> {
    let count = state.message_service.unread_count(&user.actor()).await?;
    Ok(Json(ApiResponse::ok(count)))
}

/// GET /api/messages/contacts
pub async fn contacts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Profile>>>, ApiError> {
    let contacts = state.message_service.contacts(&user.actor()).await?;
    Ok(Json(ApiResponse::ok(contacts)))
}

/// GET /api/messages/:id
pub async fn get_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Message>>, ApiError> {
    let message = state.message_service.get_message(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(message)))
}

/// POST /api/messages/:id/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Message>>, ApiError> {
    let message = state.message_service.mark_as_read(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(message)))
}

/// DELETE /api/messages/:id
pub async fn delete_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .message_service
        .delete_message(&user.actor(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
