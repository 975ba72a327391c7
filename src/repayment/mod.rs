//! Repayment negotiation domain module
//!
//! Borrower and lender alternate proposals for how a loan will be repaid.
//! Every step is appended to an immutable log; the current state is derived
//! from the latest entries.

mod model;
pub mod rules;
mod service;

pub use model::*;
pub use service::{build_state, RepaymentService};
