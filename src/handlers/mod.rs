//! API handlers for the marketplace server

mod dashboard;
mod loan;
mod message;
mod offer;
mod product_offer;
mod profile;
mod repayment;
mod storage;

pub use dashboard::*;
pub use loan::*;
pub use message::*;
pub use offer::*;
pub use product_offer::*;
pub use profile::*;
pub use repayment::*;
pub use storage::*;

// Re-export the auth extractors for handler use
pub use crate::middleware::auth::{AuthenticatedUser, SessionUser};
