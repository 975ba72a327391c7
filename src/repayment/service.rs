//! Repayment negotiation service

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::model::{ProposalTerms, RepaymentProposal, RepaymentState};
use super::rules::{party_for, plan_step, RepaymentLedger, RepaymentStep};
use crate::error::{ApiError, ApiResult};
use crate::loan::Loan;
use crate::models::Actor;
use crate::offer::Offer;

/// Appends negotiation steps to an offer's repayment log
#[derive(Clone)]
pub struct RepaymentService {
    db_pool: PgPool,
}

impl RepaymentService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Current negotiation state, visible to the two parties only
    pub async fn repayment_state(&self, actor: &Actor, offer_id: Uuid) -> ApiResult<RepaymentState> {
        let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
            .bind(offer_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Offer {} not found", offer_id)))?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(offer.loan_id)
            .fetch_one(&self.db_pool)
            .await?;

        party_for(actor.user_id, &loan, &offer)?;

        let entries = sqlx::query_as::<_, RepaymentProposal>(
            "SELECT * FROM repayment_proposals WHERE offer_id = $1 ORDER BY sequence",
        )
        .bind(offer_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(build_state(offer_id, entries))
    }

    pub async fn propose(
        &self,
        actor: &Actor,
        offer_id: Uuid,
        terms: ProposalTerms,
    ) -> ApiResult<RepaymentState> {
        self.apply_step(actor, offer_id, RepaymentStep::Propose(terms))
            .await
    }

    pub async fn counter(
        &self,
        actor: &Actor,
        offer_id: Uuid,
        terms: ProposalTerms,
    ) -> ApiResult<RepaymentState> {
        self.apply_step(actor, offer_id, RepaymentStep::Counter(terms))
            .await
    }

    pub async fn accept(
        &self,
        actor: &Actor,
        offer_id: Uuid,
        message: Option<String>,
    ) -> ApiResult<RepaymentState> {
        self.apply_step(actor, offer_id, RepaymentStep::Accept { message })
            .await
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        offer_id: Uuid,
        message: Option<String>,
    ) -> ApiResult<RepaymentState> {
        self.apply_step(actor, offer_id, RepaymentStep::Reject { message })
            .await
    }

    /// Append one step and mirror the resulting status onto the offer
    pub async fn apply_step(
        &self,
        actor: &Actor,
        offer_id: Uuid,
        step: RepaymentStep,
    ) -> ApiResult<RepaymentState> {
        let mut tx = self.db_pool.begin().await?;

        let offer = lock_offer(&mut tx, offer_id).await?;
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(offer.loan_id)
            .fetch_one(&mut *tx)
            .await?;

        let party = party_for(actor.user_id, &loan, &offer)?;

        let mut entries = sqlx::query_as::<_, RepaymentProposal>(
            "SELECT * FROM repayment_proposals WHERE offer_id = $1 ORDER BY sequence",
        )
        .bind(offer_id)
        .fetch_all(&mut *tx)
        .await?;

        let planned = plan_step(&RepaymentLedger::new(&entries), &offer, party, step)?;

        let entry = sqlx::query_as::<_, RepaymentProposal>(
            r#"
            INSERT INTO repayment_proposals (
                offer_id, sequence, proposer_id, party, action,
                method, amount, details, message, resulting_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(offer_id)
        .bind(planned.sequence)
        .bind(actor.user_id)
        .bind(planned.party)
        .bind(planned.action)
        .bind(planned.terms.method)
        .bind(planned.terms.amount)
        .bind(&planned.terms.details)
        .bind(&planned.terms.message)
        .bind(planned.resulting_status)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE offers SET repayment_status = $1, updated_at = NOW() WHERE id = $2")
            .bind(planned.resulting_status)
            .bind(offer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            offer_id = %offer_id,
            party = planned.party.as_str(),
            action = planned.action.as_str(),
            status = planned.resulting_status.as_str(),
            amount = planned.terms.amount,
            "Repayment negotiation step recorded"
        );

        entries.push(entry);
        Ok(build_state(offer_id, entries))
    }
}

async fn lock_offer(tx: &mut Transaction<'_, Postgres>, offer_id: Uuid) -> ApiResult<Offer> {
    sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1 FOR UPDATE")
        .bind(offer_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Offer {} not found", offer_id)))
}

/// Derive the offer view from its ordered log
pub fn build_state(offer_id: Uuid, history: Vec<RepaymentProposal>) -> RepaymentState {
    let ledger = RepaymentLedger::new(&history);
    let repayment_status = ledger.status();
    let borrower_repayment_proposal = ledger.latest_for(super::Party::Borrower);
    let lender_repayment_proposal = ledger.latest_for(super::Party::Lender);

    RepaymentState {
        offer_id,
        repayment_status,
        borrower_repayment_proposal,
        lender_repayment_proposal,
        history,
    }
}
