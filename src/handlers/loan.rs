//! Loan handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::loan::{CreateLoanRequest, ListLoansQuery, Loan, Payment, PaymentReceipt, RecordPaymentRequest};
use crate::models::ApiResponse;
use crate::state::AppState;

/// POST /api/loans
pub async fn create_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Loan>>), ApiError> {
    request.validate()?;

    let loan = state.loan_service.create_loan(&user.actor(), request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan))))
}

/// GET /api/loans
pub async fn list_loans(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = state.loan_service.list_loans(query).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

/// GET /api/loans/:id
pub async fn get_loan(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = state.loan_service.get_loan(id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// POST /api/loans/:id/cancel
pub async fn cancel_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = state.loan_service.cancel_loan(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// POST /api/loans/:id/complete
pub async fn complete_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = state.loan_service.complete_loan(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// POST /api/loans/:id/payments
pub async fn record_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentReceipt>>), ApiError> {
    request.validate()?;

    let receipt = state
        .loan_service
        .record_payment(&user.actor(), id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(receipt))))
}

/// GET /api/loans/:id/payments
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, ApiError> {
    let payments = state.loan_service.list_payments(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(payments)))
}
