//! Product offer route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn product_offer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/product-categories", get(list_categories))
        .route(
            "/api/loans/:id/product-offers",
            get(list_product_offers).post(create_product_offer),
        )
        .route("/api/product-offers/:id", get(get_product_offer))
        .route("/api/product-offers/:id/review", post(review_product_offer))
        .route(
            "/api/product-offers/:id/counter-offers",
            post(create_counter_offer),
        )
        .route("/api/counter-offers/:id/accept", post(accept_counter_offer))
        .route("/api/counter-offers/:id/reject", post(reject_counter_offer))
}
