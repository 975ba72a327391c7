//! Offer negotiation rules
//!
//! Pure decision functions: given the current rows, decide what must be
//! written. The service applies a plan inside a single transaction while
//! holding the loan row lock, so a plan is never applied halfway.

use uuid::Uuid;

use super::model::{Offer, OfferStatus};
use crate::error::TransitionError;
use crate::loan::{Loan, LoanStatus};
use crate::models::{Actor, UserRole};

/// Writes needed to accept an offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptancePlan {
    /// Accept the offer, activate the loan for `lender_id`, reject `reject`
    Apply { lender_id: Uuid, reject: Vec<Uuid> },
    /// The offer is already the accepted one; nothing to write
    AlreadyAccepted,
}

fn require_borrower(actor_id: Uuid, loan: &Loan) -> Result<(), TransitionError> {
    if loan.is_borrower(actor_id) {
        Ok(())
    } else {
        Err(TransitionError::NotPermitted(
            "Only the borrower can respond to offers on this loan".to_string(),
        ))
    }
}

/// Decide whether `actor` may open a new offer on `loan`
pub fn check_new_offer(actor: &Actor, loan: &Loan) -> Result<(), TransitionError> {
    if actor.role != UserRole::Lender {
        return Err(TransitionError::NotPermitted(
            "Only lenders can make offers".to_string(),
        ));
    }
    if loan.is_borrower(actor.user_id) {
        return Err(TransitionError::NotPermitted(
            "Borrowers cannot make offers on their own loans".to_string(),
        ));
    }
    if loan.status != LoanStatus::Pending {
        return Err(TransitionError::Conflict(format!(
            "Loan is {} and no longer accepts offers",
            loan.status.as_str()
        )));
    }
    Ok(())
}

/// Plan the acceptance of `offer_id` among all offers on `loan`
///
/// Accepting is idempotent: if the offer is already the accepted one and the
/// loan is active with its lender, the plan is `AlreadyAccepted`.
pub fn plan_acceptance(
    actor_id: Uuid,
    loan: &Loan,
    offers: &[Offer],
    offer_id: Uuid,
) -> Result<AcceptancePlan, TransitionError> {
    require_borrower(actor_id, loan)?;

    let offer = offers
        .iter()
        .find(|o| o.id == offer_id && o.loan_id == loan.id)
        .ok_or(TransitionError::Missing("offer"))?;

    if offer.status == OfferStatus::Accepted {
        return if loan.status == LoanStatus::Active && loan.is_lender(offer.lender_id) {
            Ok(AcceptancePlan::AlreadyAccepted)
        } else {
            Err(TransitionError::Conflict(
                "Offer is marked accepted but the loan does not reflect it".to_string(),
            ))
        };
    }

    offer.status.transition(OfferStatus::Accepted)?;

    if let Some(other) = offers
        .iter()
        .find(|o| o.id != offer_id && o.status == OfferStatus::Accepted)
    {
        return Err(TransitionError::Conflict(format!(
            "Loan already has an accepted offer ({})",
            other.id
        )));
    }

    loan.status.transition(LoanStatus::Active)?;

    let reject = offers
        .iter()
        .filter(|o| o.id != offer_id && o.status.is_open())
        .map(|o| o.id)
        .collect();

    Ok(AcceptancePlan::Apply {
        lender_id: offer.lender_id,
        reject,
    })
}

/// Decide whether the borrower may reject `offer`
pub fn check_rejection(actor_id: Uuid, loan: &Loan, offer: &Offer) -> Result<(), TransitionError> {
    require_borrower(actor_id, loan)?;
    offer.status.transition(OfferStatus::Rejected)?;
    Ok(())
}

/// Decide whether the borrower may counter `offer`
pub fn check_counter(actor_id: Uuid, loan: &Loan, offer: &Offer) -> Result<(), TransitionError> {
    require_borrower(actor_id, loan)?;
    if loan.status != LoanStatus::Pending {
        return Err(TransitionError::Conflict(format!(
            "Loan is {} and can no longer be negotiated",
            loan.status.as_str()
        )));
    }
    offer.status.transition(OfferStatus::Counter)?;
    Ok(())
}

/// Plan the cancellation of a pending loan: the open offers to reject
pub fn plan_cancellation(
    actor_id: Uuid,
    loan: &Loan,
    offers: &[Offer],
) -> Result<Vec<Uuid>, TransitionError> {
    if !loan.is_borrower(actor_id) {
        return Err(TransitionError::NotPermitted(
            "Only the borrower can cancel a loan request".to_string(),
        ));
    }
    loan.status.transition(LoanStatus::Cancelled)?;

    Ok(offers
        .iter()
        .filter(|o| o.loan_id == loan.id && o.status.is_open())
        .map(|o| o.id)
        .collect())
}
