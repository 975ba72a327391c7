//! Repayment negotiation handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::repayment::{ProposalTerms, RepaymentState, RespondRequest};
use crate::state::AppState;

type RepaymentResponse = Result<Json<ApiResponse<RepaymentState>>, ApiError>;

/// GET /api/offers/:id/repayment
pub async fn get_repayment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
) -> RepaymentResponse {
    let repayment = state
        .repayment_service
        .repayment_state(&user.actor(), offer_id)
        .await?;
    Ok(Json(ApiResponse::ok(repayment)))
}

/// POST /api/offers/:id/repayment/propose
pub async fn propose_repayment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
    Json(terms): Json<ProposalTerms>,
) -> RepaymentResponse {
    terms.validate()?;

    let repayment = state
        .repayment_service
        .propose(&user.actor(), offer_id, terms)
        .await?;
    Ok(Json(ApiResponse::ok(repayment)))
}

/// POST /api/offers/:id/repayment/counter
pub async fn counter_repayment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
    Json(terms): Json<ProposalTerms>,
) -> RepaymentResponse {
    terms.validate()?;

    let repayment = state
        .repayment_service
        .counter(&user.actor(), offer_id, terms)
        .await?;
    Ok(Json(ApiResponse::ok(repayment)))
}

/// POST /api/offers/:id/repayment/accept
pub async fn accept_repayment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
    body: Option<Json<RespondRequest>>,
) -> RepaymentResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let repayment = state
        .repayment_service
        .accept(&user.actor(), offer_id, request.message)
        .await?;
    Ok(Json(ApiResponse::ok(repayment)))
}

/// POST /api/offers/:id/repayment/reject
pub async fn reject_repayment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
    body: Option<Json<RespondRequest>>,
) -> RepaymentResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let repayment = state
        .repayment_service
        .reject(&user.actor(), offer_id, request.message)
        .await?;
    Ok(Json(ApiResponse::ok(repayment)))
}
