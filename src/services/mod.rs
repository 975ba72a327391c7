//! Cross-domain read services

mod dashboard;

pub use dashboard::{DashboardService, DashboardSummary, LoanCounts};
