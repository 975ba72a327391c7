use axum::{routing::get, Router};

use crate::handlers::get_dashboard;
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}
