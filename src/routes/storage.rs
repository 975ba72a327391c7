use axum::{routing::post, Router};

use crate::handlers::reserve_product_image;
use crate::state::AppState;

pub fn storage_routes() -> Router<AppState> {
    Router::new().route("/api/storage/product-images", post(reserve_product_image))
}
