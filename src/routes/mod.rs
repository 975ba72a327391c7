//! Route definitions for the marketplace API

mod dashboard;
mod loan;
mod message;
mod offer;
mod product_offer;
mod profile;
mod repayment;
mod storage;

pub use dashboard::dashboard_routes;
pub use loan::loan_routes;
pub use message::message_routes;
pub use offer::offer_routes;
pub use product_offer::product_offer_routes;
pub use profile::profile_routes;
pub use repayment::repayment_routes;
pub use storage::storage_routes;

use axum::Router;

use crate::state::AppState;

/// Every `/api` route, without state or layers
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(profile_routes())
        .merge(loan_routes())
        .merge(offer_routes())
        .merge(repayment_routes())
        .merge(product_offer_routes())
        .merge(message_routes())
        .merge(storage_routes())
        .merge(dashboard_routes())
}
