//! Product offer negotiation rules
//!
//! Accepting a counter offer accepts the parent product offer and rejects
//! every other pending counter on it. Reviewing the product offer directly
//! closes its pending counters the same way.

use uuid::Uuid;

use super::model::{CounterOffer, ProductOffer, ReviewDecision, ReviewStatus};
use crate::error::TransitionError;
use crate::loan::Loan;
use crate::models::{Actor, UserRole};

/// Writes needed to accept a counter offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAcceptancePlan {
    Apply { reject: Vec<Uuid> },
    AlreadyAccepted,
}

/// Writes needed to review a product offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPlan {
    pub status: ReviewStatus,
    pub reject_counters: Vec<Uuid>,
}

fn pending_siblings(counters: &[CounterOffer], except: Option<Uuid>) -> Vec<Uuid> {
    counters
        .iter()
        .filter(|c| Some(c.id) != except && c.status == ReviewStatus::Pending)
        .map(|c| c.id)
        .collect()
}

/// The borrower may attach goods to their own loan until it is closed
pub fn check_new_product_offer(actor: &Actor, loan: &Loan) -> Result<(), TransitionError> {
    if !loan.is_borrower(actor.user_id) {
        return Err(TransitionError::NotPermitted(
            "Only the borrower can offer products against this loan".to_string(),
        ));
    }
    if loan.status.is_terminal() {
        return Err(TransitionError::Conflict(format!(
            "Loan is {} and no longer accepts product offers",
            loan.status.as_str()
        )));
    }
    Ok(())
}

/// Anyone but the owner may bid on a pending product offer
pub fn check_new_counter(actor: &Actor, product: &ProductOffer) -> Result<(), TransitionError> {
    if product.borrower_id == actor.user_id {
        return Err(TransitionError::NotPermitted(
            "You cannot counter your own product offer".to_string(),
        ));
    }
    if product.status != ReviewStatus::Pending {
        return Err(TransitionError::Conflict(format!(
            "Product offer is {} and no longer accepts counter offers",
            product.status.as_str()
        )));
    }
    Ok(())
}

/// A lender other than the owner accepts or rejects the product offer
pub fn plan_review(
    actor: &Actor,
    product: &ProductOffer,
    counters: &[CounterOffer],
    decision: ReviewDecision,
) -> Result<ReviewPlan, TransitionError> {
    if actor.role != UserRole::Lender || product.borrower_id == actor.user_id {
        return Err(TransitionError::NotPermitted(
            "Only lenders can review product offers".to_string(),
        ));
    }

    let status = product.status.transition("product offer", decision.target())?;

    Ok(ReviewPlan {
        status,
        reject_counters: pending_siblings(counters, None),
    })
}

/// The owner accepts one counter offer
pub fn plan_counter_acceptance(
    actor_id: Uuid,
    product: &ProductOffer,
    counters: &[CounterOffer],
    counter_id: Uuid,
) -> Result<CounterAcceptancePlan, TransitionError> {
    if product.borrower_id != actor_id {
        return Err(TransitionError::NotPermitted(
            "Only the product offer's owner can accept counter offers".to_string(),
        ));
    }

    let counter = counters
        .iter()
        .find(|c| c.id == counter_id && c.product_offer_id == product.id)
        .ok_or(TransitionError::Missing("counter offer"))?;

    if counter.status == ReviewStatus::Accepted {
        return if product.status == ReviewStatus::Accepted {
            Ok(CounterAcceptancePlan::AlreadyAccepted)
        } else {
            Err(TransitionError::Conflict(
                "Counter offer is accepted but its product offer is not".to_string(),
            ))
        };
    }

    counter.status.transition("counter offer", ReviewStatus::Accepted)?;
    product.status.transition("product offer", ReviewStatus::Accepted)?;

    Ok(CounterAcceptancePlan::Apply {
        reject: pending_siblings(counters, Some(counter_id)),
    })
}

/// The owner rejects one pending counter offer
pub fn check_counter_rejection(
    actor_id: Uuid,
    product: &ProductOffer,
    counter: &CounterOffer,
) -> Result<(), TransitionError> {
    if product.borrower_id != actor_id {
        return Err(TransitionError::NotPermitted(
            "Only the product offer's owner can reject counter offers".to_string(),
        ));
    }
    counter.status.transition("counter offer", ReviewStatus::Rejected)?;
    Ok(())
}
