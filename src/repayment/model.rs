//! Repayment negotiation models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Repayment negotiation status, mirrored on the offer row
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "repayment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RepaymentStatus {
    Pending,
    Proposed,
    Accepted,
    Counter,
    Rejected,
}

impl RepaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RepaymentStatus::Pending => "pending",
            RepaymentStatus::Proposed => "proposed",
            RepaymentStatus::Accepted => "accepted",
            RepaymentStatus::Counter => "counter",
            RepaymentStatus::Rejected => "rejected",
        }
    }

    /// A proposal is on the table waiting for the other party
    pub fn awaits_response(self) -> bool {
        matches!(self, RepaymentStatus::Proposed | RepaymentStatus::Counter)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RepaymentStatus::Accepted | RepaymentStatus::Rejected)
    }
}

/// How the borrower will repay
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "repayment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RepaymentMethod {
    Payment,
    Services,
}

/// Step taken in the negotiation
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "repayment_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RepaymentAction {
    Propose,
    Counter,
    Accept,
    Reject,
}

impl RepaymentAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RepaymentAction::Propose => "propose",
            RepaymentAction::Counter => "counter",
            RepaymentAction::Accept => "accept",
            RepaymentAction::Reject => "reject",
        }
    }

    /// Steps that put new terms on the table
    pub fn carries_terms(self) -> bool {
        matches!(self, RepaymentAction::Propose | RepaymentAction::Counter)
    }
}

/// Side of the negotiation
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "negotiation_party", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Borrower,
    Lender,
}

impl Party {
    pub fn as_str(self) -> &'static str {
        match self {
            Party::Borrower => "borrower",
            Party::Lender => "lender",
        }
    }
}

/// One immutable entry of an offer's repayment log
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct RepaymentProposal {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub sequence: i32,
    pub proposer_id: Uuid,
    pub party: Party,
    pub action: RepaymentAction,
    pub method: RepaymentMethod,
    pub amount: i64,
    pub details: Option<String>,
    pub message: Option<String>,
    pub resulting_status: RepaymentStatus,
    pub proposed_at: DateTime<Utc>,
}

/// Terms of a repayment proposal
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Validate)]
pub struct ProposalTerms {
    pub method: RepaymentMethod,
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
    #[validate(length(max = 2000))]
    pub details: Option<String>,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// Optional note attached to an accept or reject
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RespondRequest {
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// A party's latest proposal, as shown in the offer view
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ProposalSlot {
    pub method: RepaymentMethod,
    pub amount: i64,
    pub details: Option<String>,
    pub message: Option<String>,
    pub proposed_at: DateTime<Utc>,
}

impl From<&RepaymentProposal> for ProposalSlot {
    fn from(entry: &RepaymentProposal) -> Self {
        Self {
            method: entry.method,
            amount: entry.amount,
            details: entry.details.clone(),
            message: entry.message.clone(),
            proposed_at: entry.proposed_at,
        }
    }
}

/// Current repayment negotiation state of an offer
#[derive(Debug, Serialize)]
pub struct RepaymentState {
    pub offer_id: Uuid,
    pub repayment_status: RepaymentStatus,
    pub borrower_repayment_proposal: Option<ProposalSlot>,
    pub lender_repayment_proposal: Option<ProposalSlot>,
    pub history: Vec<RepaymentProposal>,
}
