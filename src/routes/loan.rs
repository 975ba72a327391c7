//! Loan route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/cancel", post(cancel_loan))
        .route("/api/loans/:id/complete", post(complete_loan))
        .route(
            "/api/loans/:id/payments",
            get(list_payments).post(record_payment),
        )
}
