//! Repayment negotiation rules
//!
//! `pending → proposed → {accepted, counter, rejected}` and
//! `counter → {accepted, counter, rejected}`. Whoever put the latest terms on
//! the table waits; only the other party may counter, accept or reject.

use uuid::Uuid;

use super::model::{
    Party, ProposalSlot, ProposalTerms, RepaymentAction, RepaymentProposal, RepaymentStatus,
};
use crate::error::TransitionError;
use crate::loan::Loan;
use crate::offer::{Offer, OfferStatus};

/// A negotiation step requested by one party
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepaymentStep {
    Propose(ProposalTerms),
    Counter(ProposalTerms),
    Accept { message: Option<String> },
    Reject { message: Option<String> },
}

impl RepaymentStep {
    pub fn action(&self) -> RepaymentAction {
        match self {
            RepaymentStep::Propose(_) => RepaymentAction::Propose,
            RepaymentStep::Counter(_) => RepaymentAction::Counter,
            RepaymentStep::Accept { .. } => RepaymentAction::Accept,
            RepaymentStep::Reject { .. } => RepaymentAction::Reject,
        }
    }
}

/// Entry to append to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub sequence: i32,
    pub party: Party,
    pub action: RepaymentAction,
    pub terms: ProposalTerms,
    pub resulting_status: RepaymentStatus,
}

/// Read-only view over an offer's log, ordered by sequence
#[derive(Debug, Clone, Copy)]
pub struct RepaymentLedger<'a> {
    entries: &'a [RepaymentProposal],
}

impl<'a> RepaymentLedger<'a> {
    /// `entries` must be sorted by ascending sequence
    pub fn new(entries: &'a [RepaymentProposal]) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].sequence < w[1].sequence));
        Self { entries }
    }

    pub fn status(&self) -> RepaymentStatus {
        self.entries
            .last()
            .map(|e| e.resulting_status)
            .unwrap_or(RepaymentStatus::Pending)
    }

    pub fn next_sequence(&self) -> i32 {
        self.entries.last().map(|e| e.sequence + 1).unwrap_or(1)
    }

    /// Latest entry that put terms on the table
    pub fn last_proposal(&self) -> Option<&'a RepaymentProposal> {
        self.entries.iter().rev().find(|e| e.action.carries_terms())
    }

    /// Latest terms proposed by `party`
    pub fn latest_for(&self, party: Party) -> Option<ProposalSlot> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.party == party && e.action.carries_terms())
            .map(ProposalSlot::from)
    }
}

/// Which side `actor_id` negotiates for on this offer
pub fn party_for(actor_id: Uuid, loan: &Loan, offer: &Offer) -> Result<Party, TransitionError> {
    if loan.is_borrower(actor_id) {
        Ok(Party::Borrower)
    } else if offer.lender_id == actor_id {
        Ok(Party::Lender)
    } else {
        Err(TransitionError::NotPermitted(
            "Only the borrower and the offering lender can negotiate repayment".to_string(),
        ))
    }
}

/// Status reached by `action`, or why it is not allowed
pub fn next_status(
    current: RepaymentStatus,
    last_proposer: Option<Party>,
    actor: Party,
    action: RepaymentAction,
) -> Result<RepaymentStatus, TransitionError> {
    let target = match action {
        RepaymentAction::Propose => RepaymentStatus::Proposed,
        RepaymentAction::Counter => RepaymentStatus::Counter,
        RepaymentAction::Accept => RepaymentStatus::Accepted,
        RepaymentAction::Reject => RepaymentStatus::Rejected,
    };

    let invalid = || TransitionError::InvalidTransition {
        entity: "repayment",
        from: current.as_str(),
        to: target.as_str(),
    };

    match action {
        RepaymentAction::Propose if current == RepaymentStatus::Pending => Ok(target),
        RepaymentAction::Propose => Err(invalid()),
        _ if !current.awaits_response() => Err(invalid()),
        _ if last_proposer == Some(actor) => Err(TransitionError::NotPermitted(format!(
            "Waiting for the {} to respond to your proposal",
            match actor {
                Party::Borrower => Party::Lender.as_str(),
                Party::Lender => Party::Borrower.as_str(),
            }
        ))),
        _ => Ok(target),
    }
}

/// Plan the log entry for `step` taken by `party`
pub fn plan_step(
    ledger: &RepaymentLedger<'_>,
    offer: &Offer,
    party: Party,
    step: RepaymentStep,
) -> Result<PlannedEntry, TransitionError> {
    if offer.status == OfferStatus::Rejected {
        return Err(TransitionError::Conflict(
            "Repayment cannot be negotiated on a rejected offer".to_string(),
        ));
    }

    let last = ledger.last_proposal();
    let action = step.action();
    let resulting_status = next_status(ledger.status(), last.map(|e| e.party), party, action)?;

    let terms = match step {
        RepaymentStep::Propose(terms) | RepaymentStep::Counter(terms) => terms,
        RepaymentStep::Accept { message } | RepaymentStep::Reject { message } => {
            // Responses restate the terms they answer so each entry stands alone.
            let answered = last.ok_or(TransitionError::Missing("repayment proposal"))?;
            ProposalTerms {
                method: answered.method,
                amount: answered.amount,
                details: answered.details.clone(),
                message,
            }
        }
    };

    Ok(PlannedEntry {
        sequence: ledger.next_sequence(),
        party,
        action,
        terms,
        resulting_status,
    })
}
