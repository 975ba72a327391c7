//! Loan domain module
//!
//! Loan requests, their lifecycle and recorded payments.

mod model;
mod service;

pub use model::*;
pub use service::LoanService;
