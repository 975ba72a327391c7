//! Product offer domain module
//!
//! A borrower puts up a tangible good against a loan; lenders review it or
//! bid a different valuation with counter offers.

mod model;
pub mod rules;
mod service;

pub use model::*;
pub use service::ProductOfferService;
