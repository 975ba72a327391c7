//! Offer models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::TransitionError;
use crate::repayment::RepaymentStatus;

/// Offer status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "offer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Counter,
}

impl OfferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Counter => "counter",
        }
    }

    /// `pending → {accepted, rejected, counter}`, `counter → {accepted, rejected}`
    pub fn can_transition_to(self, next: OfferStatus) -> bool {
        matches!(
            (self, next),
            (OfferStatus::Pending, OfferStatus::Accepted)
                | (OfferStatus::Pending, OfferStatus::Rejected)
                | (OfferStatus::Pending, OfferStatus::Counter)
                | (OfferStatus::Counter, OfferStatus::Accepted)
                | (OfferStatus::Counter, OfferStatus::Rejected)
        )
    }

    /// Still awaiting a decision from the borrower
    pub fn is_open(self) -> bool {
        matches!(self, OfferStatus::Pending | OfferStatus::Counter)
    }

    pub fn transition(self, next: OfferStatus) -> Result<OfferStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::InvalidTransition {
                entity: "offer",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

/// A lender's offer to fund a loan
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Offer {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub lender_id: Uuid,
    pub amount: i64,
    pub message: Option<String>,
    pub status: OfferStatus,
    pub counter_amount: Option<i64>,
    pub counter_message: Option<String>,
    pub repayment_status: RepaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to make an offer on a loan
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOfferRequest {
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// Borrower's counter to an offer
#[derive(Debug, Deserialize, Validate)]
pub struct CounterOfferTermsRequest {
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// Outcome of accepting an offer
#[derive(Debug, Serialize)]
pub struct AcceptOfferResponse {
    pub offer: Offer,
    pub loan: crate::loan::Loan,
    pub rejected_offer_ids: Vec<Uuid>,
    /// True when the offer was already accepted and nothing was written
    pub already_accepted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_transitions() {
        assert!(OfferStatus::Pending.can_transition_to(OfferStatus::Accepted));
        assert!(OfferStatus::Pending.can_transition_to(OfferStatus::Counter));
        assert!(OfferStatus::Counter.can_transition_to(OfferStatus::Accepted));
        assert!(OfferStatus::Counter.can_transition_to(OfferStatus::Rejected));

        assert!(!OfferStatus::Counter.can_transition_to(OfferStatus::Counter));
        assert!(!OfferStatus::Accepted.can_transition_to(OfferStatus::Rejected));
        assert!(!OfferStatus::Rejected.can_transition_to(OfferStatus::Accepted));
    }

    #[test]
    fn test_open_states() {
        assert!(OfferStatus::Pending.is_open());
        assert!(OfferStatus::Counter.is_open());
        assert!(!OfferStatus::Accepted.is_open());
        assert!(!OfferStatus::Rejected.is_open());
    }

    #[test]
    fn test_status_json_matches_database_labels() {
        for status in [
            OfferStatus::Pending,
            OfferStatus::Accepted,
            OfferStatus::Rejected,
            OfferStatus::Counter,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
