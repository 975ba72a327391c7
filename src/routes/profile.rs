//! Profile route definitions

use axum::{routing::get, Router};

use crate::handlers::{get_my_profile, get_profile, upsert_my_profile};
use crate::state::AppState;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/profiles/me",
            get(get_my_profile).put(upsert_my_profile),
        )
        .route("/api/profiles/:id", get(get_profile))
}
