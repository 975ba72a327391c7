//! Offer handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::offer::{AcceptOfferResponse, CounterOfferTermsRequest, CreateOfferRequest, Offer};
use crate::state::AppState;

/// POST /api/loans/:id/offers
pub async fn create_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
    Json(request): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Offer>>), ApiError> {
    request.validate()?;

    let offer = state
        .offer_service
        .create_offer(&user.actor(), loan_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(offer))))
}

/// GET /api/loans/:id/offers
pub async fn list_loan_offers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Offer>>>, ApiError> {
    let offers = state.offer_service.list_offers_for_loan(loan_id).await?;
    Ok(Json(ApiResponse::ok(offers)))
}

/// GET /api/offers - offers made by the caller
pub async fn list_my_offers(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Offer>>>, ApiError> {
    let offers = state.offer_service.list_offers_by_lender(user.user_id).await?;
    Ok(Json(ApiResponse::ok(offers)))
}

/// GET /api/offers/:id
pub async fn get_offer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Offer>>, ApiError> {
    let offer = state.offer_service.get_offer(id).await?;
    Ok(Json(ApiResponse::ok(offer)))
}

/// POST /api/offers/:id/accept
pub async fn accept_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AcceptOfferResponse>>, ApiError> {
    let accepted = state.offer_service.accept_offer(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(accepted)))
}

/// POST /api/offers/:id/reject
pub async fn reject_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Offer>>, ApiError> {
    let offer = state.offer_service.reject_offer(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(offer)))
}

/// POST /api/offers/:id/counter
pub async fn counter_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CounterOfferTermsRequest>,
) -> Result<Json<ApiResponse<Offer>>, ApiError> {
    request.validate()?;

    let offer = state
        .offer_service
        .counter_offer(&user.actor(), id, request)
        .await?;

    Ok(Json(ApiResponse::ok(offer)))
}
