//! Repayment negotiation route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn repayment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/offers/:id/repayment", get(get_repayment))
        .route("/api/offers/:id/repayment/propose", post(propose_repayment))
        .route("/api/offers/:id/repayment/counter", post(counter_repayment))
        .route("/api/offers/:id/repayment/accept", post(accept_repayment))
        .route("/api/offers/:id/repayment/reject", post(reject_repayment))
}
