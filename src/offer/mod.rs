//! Offer domain module
//!
//! Lenders' offers against loan requests and the rules for accepting,
//! rejecting and countering them.

mod model;
pub mod rules;
mod service;

pub use model::*;
pub(crate) use service::reject_offers;
pub use service::OfferService;
