//! Product offer and counter offer handlers

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
use crate::product_offer::{
    CounterAcceptance, CounterOffer, CreateCounterOfferRequest, CreateProductOfferRequest,
    ProductCategory, ProductOffer, ProductOfferDetail, ReviewProductOfferRequest,
};
use crate::state::AppState;

/// GET /api/product-categories
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<ProductCategory>>>, ApiError> {
    let categories = state.product_offer_service.list_categories().await?;
    Ok(Json(ApiResponse::ok(categories)))
}

/// POST /api/loans/:id/product-offers
pub async fn create_product_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
    Json(request): Json<CreateProductOfferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductOffer>>), ApiError> {
    request.validate()?;

    let product = state
        .product_offer_service
        .create_product_offer(&user.actor(), loan_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(product))))
}

/// GET /api/loans/:id/product-offers
pub async fn list_product_offers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ProductOffer>>>, ApiError> {
    let products = state
        .product_offer_service
        .list_product_offers(loan_id)
        .await?;
    Ok(Json(ApiResponse::ok(products)))
}

/// GET /api/product-offers/:id
pub async fn get_product_offer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductOfferDetail>>, ApiError> {
    let detail = state.product_offer_service.get_product_offer(id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// POST /api/product-offers/:id/review
pub async fn review_product_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewProductOfferRequest>,
) -> Result<Json<ApiResponse<ProductOfferDetail>>, ApiError> {
    let detail = state
        .product_offer_service
        .review_product_offer(&user.actor(), id, request.decision)
        .await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// POST /api/product-offers/:id/counter-offers
pub async fn create_counter_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_offer_id): Path<Uuid>,
    Json(request): Json<CreateCounterOfferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CounterOffer>>), ApiError> {
    request.validate()?;

    let counter = state
        .product_offer_service
        .create_counter_offer(&user.actor(), product_offer_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(counter))))
}

/// POST /api/counter-offers/:id/accept
pub async fn accept_counter_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CounterAcceptance>>, ApiError> {
    let accepted = state
        .product_offer_service
        .accept_counter_offer(&user.actor(), id)
        .await?;
    Ok(Json(ApiResponse::ok(accepted)))
}

/// POST /api/counter-offers/:id/reject
pub async fn reject_counter_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CounterOffer>>, ApiError> {
    let counter = state
        .product_offer_service
        .reject_counter_offer(&user.actor(), id)
        .await?;
    Ok(Json(ApiResponse::ok(counter)))
}
