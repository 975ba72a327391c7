//! Offer route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn offer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/loans/:id/offers",
            get(list_loan_offers).post(create_offer),
        )
        .route("/api/offers", get(list_my_offers))
        .route("/api/offers/:id", get(get_offer))
        .route("/api/offers/:id/accept", post(accept_offer))
        .route("/api/offers/:id/reject", post(reject_offer))
        .route("/api/offers/:id/counter", post(counter_offer))
}
