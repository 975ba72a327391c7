//! Loan models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::TransitionError;

/// Loan status
///
/// `pending → {active, cancelled}`, `active → completed`. Completed and
/// cancelled are terminal.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
            LoanStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Active)
                | (LoanStatus::Pending, LoanStatus::Cancelled)
                | (LoanStatus::Active, LoanStatus::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Cancelled)
    }

    /// Check a transition, naming both ends on failure
    pub fn transition(self, next: LoanStatus) -> Result<LoanStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::InvalidTransition {
                entity: "loan",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

/// Loan request
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: Uuid,
    pub borrower_id: Uuid,
    pub lender_id: Option<Uuid>,
    pub amount: i64,
    pub description: String,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_borrower(&self, user_id: Uuid) -> bool {
        self.borrower_id == user_id
    }

    pub fn is_lender(&self, user_id: Uuid) -> bool {
        self.lender_id == Some(user_id)
    }
}

/// Payment recorded against an active loan
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub payer_id: Uuid,
    pub amount: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a new loan
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
    #[validate(
        length(min = 1, max = 2000, message = "Description is required"),
        custom(function = "crate::models::not_blank", message = "Description is required")
    )]
    pub description: String,
}

/// Request to record a payment
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Query for listing loans
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub borrower_id: Option<Uuid>,
    pub lender_id: Option<Uuid>,
    pub status: Option<LoanStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Result of recording a payment
#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub total_paid: i64,
    pub loan_status: LoanStatus,
}

/// Whether payments so far settle the principal
pub fn settles(total_paid: i64, principal: i64) -> bool {
    total_paid >= principal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_transitions() {
        assert!(LoanStatus::Pending.can_transition_to(LoanStatus::Active));
        assert!(LoanStatus::Pending.can_transition_to(LoanStatus::Cancelled));
        assert!(LoanStatus::Active.can_transition_to(LoanStatus::Completed));

        assert!(!LoanStatus::Pending.can_transition_to(LoanStatus::Completed));
        assert!(!LoanStatus::Active.can_transition_to(LoanStatus::Cancelled));
        assert!(!LoanStatus::Completed.can_transition_to(LoanStatus::Active));
        assert!(!LoanStatus::Cancelled.can_transition_to(LoanStatus::Pending));
    }

    #[test]
    fn test_transition_error_names_states() {
        let err = LoanStatus::Completed
            .transition(LoanStatus::Active)
            .unwrap_err();
        assert_eq!(err.to_string(), "loan cannot move from completed to active");
    }

    #[test]
    fn test_terminal_states() {
        assert!(LoanStatus::Completed.is_terminal());
        assert!(LoanStatus::Cancelled.is_terminal());
        assert!(!LoanStatus::Active.is_terminal());
    }

    #[test]
    fn test_create_request_validation() {
        let valid = CreateLoanRequest {
            amount: 1000,
            description: "Seed money for a market stall".to_string(),
        };
        assert!(valid.validate().is_ok());

        let zero = CreateLoanRequest {
            amount: 0,
            description: "x".to_string(),
        };
        assert!(zero.validate().is_err());

        let empty = CreateLoanRequest {
            amount: 10,
            description: String::new(),
        };
        assert!(empty.validate().is_err());

        let blank = CreateLoanRequest {
            amount: 10,
            description: "   ".to_string(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_settles() {
        assert!(!settles(499, 500));
        assert!(settles(500, 500));
        assert!(settles(600, 500));
    }
}
