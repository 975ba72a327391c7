//! Offer service layer - business logic for offer negotiation

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::model::{
    AcceptOfferResponse, CounterOfferTermsRequest, CreateOfferRequest, Offer, OfferStatus,
};
use super::rules::{self, AcceptancePlan};
use crate::error::{ApiError, ApiResult};
use crate::loan::{Loan, LoanStatus};
use crate::models::Actor;

/// Offer service for managing the offer lifecycle
#[derive(Clone)]
pub struct OfferService {
    db_pool: PgPool,
}

impl OfferService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Make an offer on a pending loan
    pub async fn create_offer(
        &self,
        actor: &Actor,
        loan_id: Uuid,
        request: CreateOfferRequest,
    ) -> ApiResult<Offer> {
        let mut tx = self.db_pool.begin().await?;

        // Share lock: an acceptance or cancellation in flight finishes first,
        // and neither can start until this offer is committed.
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR SHARE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", loan_id)))?;

        rules::check_new_offer(actor, &loan)?;

        let offer = sqlx::query_as::<_, Offer>(
            r#"
            INSERT INTO offers (loan_id, lender_id, amount, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(actor.user_id)
        .bind(request.amount)
        .bind(request.message)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            offer_id = %offer.id,
            loan_id = %loan_id,
            lender_id = %actor.user_id,
            amount = offer.amount,
            "Offer created"
        );

        Ok(offer)
    }

    /// Get an offer by ID
    pub async fn get_offer(&self, id: Uuid) -> ApiResult<Offer> {
        sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Offer {} not found", id)))
    }

    /// All offers on a loan, oldest first
    pub async fn list_offers_for_loan(&self, loan_id: Uuid) -> ApiResult<Vec<Offer>> {
        let offers = sqlx::query_as::<_, Offer>(
            "SELECT * FROM offers WHERE loan_id = $1 ORDER BY created_at, id",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(offers)
    }

    /// Offers made by a lender, newest first
    pub async fn list_offers_by_lender(&self, lender_id: Uuid) -> ApiResult<Vec<Offer>> {
        let offers = sqlx::query_as::<_, Offer>(
            "SELECT * FROM offers WHERE lender_id = $1 ORDER BY created_at DESC",
        )
        .bind(lender_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(offers)
    }

    /// Accept an offer: activate the loan and reject its other open offers
    ///
    /// All writes happen in one transaction holding the loan row lock, so two
    /// concurrent acceptances on the same loan serialize and the second one
    /// fails with a conflict instead of leaving two accepted offers.
    pub async fn accept_offer(&self, actor: &Actor, offer_id: Uuid) -> ApiResult<AcceptOfferResponse> {
        let mut tx = self.db_pool.begin().await?;

        let (loan, offers) = lock_loan_with_offers(&mut tx, offer_id).await?;

        match rules::plan_acceptance(actor.user_id, &loan, &offers, offer_id)? {
            AcceptancePlan::AlreadyAccepted => {
                tx.rollback().await?;
                let offer = offers
                    .into_iter()
                    .find(|o| o.id == offer_id)
                    .ok_or_else(|| ApiError::NotFound(format!("Offer {} not found", offer_id)))?;

                tracing::debug!(offer_id = %offer_id, "Offer already accepted, nothing to do");

                Ok(AcceptOfferResponse {
                    offer,
                    loan,
                    rejected_offer_ids: Vec::new(),
                    already_accepted: true,
                })
            }
            AcceptancePlan::Apply { lender_id, reject } => {
                let offer = sqlx::query_as::<_, Offer>(
                    "UPDATE offers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
                )
                .bind(OfferStatus::Accepted)
                .bind(offer_id)
                .fetch_one(&mut *tx)
                .await?;

                let loan = sqlx::query_as::<_, Loan>(
                    r#"
                    UPDATE loans
                    SET status = $1, lender_id = $2, updated_at = NOW()
                    WHERE id = $3
                    RETURNING *
                    "#,
                )
                .bind(LoanStatus::Active)
                .bind(lender_id)
                .bind(loan.id)
                .fetch_one(&mut *tx)
                .await?;

                reject_offers(&mut tx, &reject).await?;

                tx.commit().await?;

                tracing::info!(
                    offer_id = %offer_id,
                    loan_id = %loan.id,
                    lender_id = %lender_id,
                    rejected = reject.len(),
                    "Offer accepted, loan activated"
                );

                Ok(AcceptOfferResponse {
                    offer,
                    loan,
                    rejected_offer_ids: reject,
                    already_accepted: false,
                })
            }
        }
    }

    /// Reject a pending or countered offer
    pub async fn reject_offer(&self, actor: &Actor, offer_id: Uuid) -> ApiResult<Offer> {
        let mut tx = self.db_pool.begin().await?;
        let (loan, offers) = lock_loan_with_offers(&mut tx, offer_id).await?;
        let offer = find_offer(&offers, offer_id)?;

        rules::check_rejection(actor.user_id, &loan, offer)?;

        let offer = sqlx::query_as::<_, Offer>(
            "UPDATE offers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(OfferStatus::Rejected)
        .bind(offer_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(offer_id = %offer_id, loan_id = %loan.id, "Offer rejected");

        Ok(offer)
    }

    /// Counter a pending offer with the borrower's own terms
    pub async fn counter_offer(
        &self,
        actor: &Actor,
        offer_id: Uuid,
        request: CounterOfferTermsRequest,
    ) -> ApiResult<Offer> {
        let mut tx = self.db_pool.begin().await?;
        let (loan, offers) = lock_loan_with_offers(&mut tx, offer_id).await?;
        let offer = find_offer(&offers, offer_id)?;

        rules::check_counter(actor.user_id, &loan, offer)?;

        let offer = sqlx::query_as::<_, Offer>(
            r#"
            UPDATE offers
            SET status = $1, counter_amount = $2, counter_message = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(OfferStatus::Counter)
        .bind(request.amount)
        .bind(request.message)
        .bind(offer_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            offer_id = %offer_id,
            loan_id = %loan.id,
            counter_amount = request.amount,
            "Offer countered"
        );

        Ok(offer)
    }
}

fn find_offer(offers: &[Offer], offer_id: Uuid) -> ApiResult<&Offer> {
    offers
        .iter()
        .find(|o| o.id == offer_id)
        .ok_or_else(|| ApiError::NotFound(format!("Offer {} not found", offer_id)))
}

/// Lock the loan owning `offer_id`, then all offers on it
///
/// Every offer mutation takes the loan lock first, which keeps lock order
/// consistent across concurrent requests.
async fn lock_loan_with_offers(
    tx: &mut Transaction<'_, Postgres>,
    offer_id: Uuid,
) -> ApiResult<(Loan, Vec<Offer>)> {
    let loan = sqlx::query_as::<_, Loan>(
        r#"
        SELECT l.* FROM loans l
        JOIN offers o ON o.loan_id = l.id
        WHERE o.id = $1
        FOR UPDATE OF l
        "#,
    )
    .bind(offer_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Offer {} not found", offer_id)))?;

    let offers = sqlx::query_as::<_, Offer>(
        "SELECT * FROM offers WHERE loan_id = $1 ORDER BY created_at, id FOR UPDATE",
    )
    .bind(loan.id)
    .fetch_all(&mut **tx)
    .await?;

    Ok((loan, offers))
}

/// Mark the given offers rejected
pub(crate) async fn reject_offers(
    tx: &mut Transaction<'_, Postgres>,
    offer_ids: &[Uuid],
) -> ApiResult<()> {
    if offer_ids.is_empty() {
        return Ok(());
    }

    sqlx::query("UPDATE offers SET status = $1, updated_at = NOW() WHERE id = ANY($2)")
        .bind(OfferStatus::Rejected)
        .bind(offer_ids)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
