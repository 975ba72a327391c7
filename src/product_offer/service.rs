//! Product offer service layer

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::model::{
    CounterAcceptance, CounterOffer, CreateCounterOfferRequest, CreateProductOfferRequest,
    ProductCategory, ProductOffer, ProductOfferDetail, ReviewDecision, ReviewStatus,
};
use super::rules::{self, CounterAcceptancePlan};
use crate::error::{ApiError, ApiResult};
use crate::loan::Loan;
use crate::models::Actor;

/// Product offer service
#[derive(Clone)]
pub struct ProductOfferService {
    db_pool: PgPool,
}

impl ProductOfferService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn list_categories(&self) -> ApiResult<Vec<ProductCategory>> {
        let categories =
            sqlx::query_as::<_, ProductCategory>("SELECT * FROM product_categories ORDER BY name")
                .fetch_all(&self.db_pool)
                .await?;

        Ok(categories)
    }

    /// Put a product up against one of the actor's loans
    pub async fn create_product_offer(
        &self,
        actor: &Actor,
        loan_id: Uuid,
        request: CreateProductOfferRequest,
    ) -> ApiResult<ProductOffer> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ApiError::ValidationError("Title is required".to_string()));
        }

        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR SHARE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", loan_id)))?;

        rules::check_new_product_offer(actor, &loan)?;

        let product = sqlx::query_as::<_, ProductOffer>(
            r#"
            INSERT INTO product_offers (
                loan_id, borrower_id, category_id, title, description,
                specifications, age, amount, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(actor.user_id)
        .bind(request.category_id)
        .bind(title)
        .bind(request.description)
        .bind(request.specifications)
        .bind(request.age)
        .bind(request.amount)
        .bind(request.image_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            product_offer_id = %product.id,
            loan_id = %loan_id,
            amount = product.amount,
            "Product offer created"
        );

        Ok(product)
    }

    pub async fn list_product_offers(&self, loan_id: Uuid) -> ApiResult<Vec<ProductOffer>> {
        let products = sqlx::query_as::<_, ProductOffer>(
            "SELECT * FROM product_offers WHERE loan_id = $1 ORDER BY created_at DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(products)
    }

    /// Product offer with its counter offers
    pub async fn get_product_offer(&self, id: Uuid) -> ApiResult<ProductOfferDetail> {
        let product_offer =
            sqlx::query_as::<_, ProductOffer>("SELECT * FROM product_offers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Product offer {} not found", id)))?;

        let counter_offers = sqlx::query_as::<_, CounterOffer>(
            "SELECT * FROM counter_offers WHERE product_offer_id = $1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(ProductOfferDetail {
            product_offer,
            counter_offers,
        })
    }

    /// Lender accepts or rejects a product offer outright
    pub async fn review_product_offer(
        &self,
        actor: &Actor,
        id: Uuid,
        decision: ReviewDecision,
    ) -> ApiResult<ProductOfferDetail> {
        let mut tx = self.db_pool.begin().await?;
        let (product, counters) = lock_product_with_counters(&mut tx, id).await?;

        let plan = rules::plan_review(actor, &product, &counters, decision)?;

        let product_offer = sqlx::query_as::<_, ProductOffer>(
            "UPDATE product_offers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(plan.status)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        reject_counters(&mut tx, &plan.reject_counters).await?;

        let counter_offers = sqlx::query_as::<_, CounterOffer>(
            "SELECT * FROM counter_offers WHERE product_offer_id = $1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            product_offer_id = %id,
            reviewer_id = %actor.user_id,
            status = plan.status.as_str(),
            closed_counters = plan.reject_counters.len(),
            "Product offer reviewed"
        );

        Ok(ProductOfferDetail {
            product_offer,
            counter_offers,
        })
    }

    /// Bid a different valuation on a pending product offer
    pub async fn create_counter_offer(
        &self,
        actor: &Actor,
        product_offer_id: Uuid,
        request: CreateCounterOfferRequest,
    ) -> ApiResult<CounterOffer> {
        let mut tx = self.db_pool.begin().await?;

        // Share lock keeps the parent pending until this counter is in.
        let product = sqlx::query_as::<_, ProductOffer>(
            "SELECT * FROM product_offers WHERE id = $1 FOR SHARE",
        )
        .bind(product_offer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Product offer {} not found", product_offer_id))
        })?;

        rules::check_new_counter(actor, &product)?;

        let counter = sqlx::query_as::<_, CounterOffer>(
            r#"
            INSERT INTO counter_offers (product_offer_id, user_id, amount, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(product_offer_id)
        .bind(actor.user_id)
        .bind(request.amount)
        .bind(request.message)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            counter_offer_id = %counter.id,
            product_offer_id = %product_offer_id,
            amount = counter.amount,
            "Counter offer created"
        );

        Ok(counter)
    }

    /// Owner accepts a counter offer; parent accepted, pending siblings rejected
    pub async fn accept_counter_offer(
        &self,
        actor: &Actor,
        counter_id: Uuid,
    ) -> ApiResult<CounterAcceptance> {
        let mut tx = self.db_pool.begin().await?;
        let product_id = product_id_for_counter(&mut tx, counter_id).await?;
        let (product, counters) = lock_product_with_counters(&mut tx, product_id).await?;

        match rules::plan_counter_acceptance(actor.user_id, &product, &counters, counter_id)? {
            CounterAcceptancePlan::AlreadyAccepted => {
                tx.rollback().await?;
                let counter_offer = counters
                    .into_iter()
                    .find(|c| c.id == counter_id)
                    .ok_or_else(|| {
                        ApiError::NotFound(format!("Counter offer {} not found", counter_id))
                    })?;

                Ok(CounterAcceptance {
                    counter_offer,
                    product_offer: product,
                    rejected_counter_ids: Vec::new(),
                    already_accepted: true,
                })
            }
            CounterAcceptancePlan::Apply { reject } => {
                let counter_offer = sqlx::query_as::<_, CounterOffer>(
                    "UPDATE counter_offers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
                )
                .bind(ReviewStatus::Accepted)
                .bind(counter_id)
                .fetch_one(&mut *tx)
                .await?;

                let product_offer = sqlx::query_as::<_, ProductOffer>(
                    "UPDATE product_offers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
                )
                .bind(ReviewStatus::Accepted)
                .bind(product_id)
                .fetch_one(&mut *tx)
                .await?;

                reject_counters(&mut tx, &reject).await?;

                tx.commit().await?;

                tracing::info!(
                    counter_offer_id = %counter_id,
                    product_offer_id = %product_id,
                    rejected = reject.len(),
                    "Counter offer accepted"
                );

                Ok(CounterAcceptance {
                    counter_offer,
                    product_offer,
                    rejected_counter_ids: reject,
                    already_accepted: false,
                })
            }
        }
    }

    /// Owner rejects a pending counter offer
    pub async fn reject_counter_offer(
        &self,
        actor: &Actor,
        counter_id: Uuid,
    ) -> ApiResult<CounterOffer> {
        let mut tx = self.db_pool.begin().await?;
        let product_id = product_id_for_counter(&mut tx, counter_id).await?;
        let (product, counters) = lock_product_with_counters(&mut tx, product_id).await?;

        let counter = counters
            .iter()
            .find(|c| c.id == counter_id)
            .ok_or_else(|| ApiError::NotFound(format!("Counter offer {} not found", counter_id)))?;

        rules::check_counter_rejection(actor.user_id, &product, counter)?;

        let counter = sqlx::query_as::<_, CounterOffer>(
            "UPDATE counter_offers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(ReviewStatus::Rejected)
        .bind(counter_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(counter_offer_id = %counter_id, "Counter offer rejected");

        Ok(counter)
    }
}

async fn product_id_for_counter(
    tx: &mut Transaction<'_, Postgres>,
    counter_id: Uuid,
) -> ApiResult<Uuid> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT product_offer_id FROM counter_offers WHERE id = $1")
            .bind(counter_id)
            .fetch_optional(&mut **tx)
            .await?;

    row.map(|(id,)| id)
        .ok_or_else(|| ApiError::NotFound(format!("Counter offer {} not found", counter_id)))
}

/// Lock a product offer, then its counter offers
async fn lock_product_with_counters(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
) -> ApiResult<(ProductOffer, Vec<CounterOffer>)> {
    let product =
        sqlx::query_as::<_, ProductOffer>("SELECT * FROM product_offers WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Product offer {} not found", product_id)))?;

    let counters = sqlx::query_as::<_, CounterOffer>(
        "SELECT * FROM counter_offers WHERE product_offer_id = $1 ORDER BY created_at, id FOR UPDATE",
    )
    .bind(product_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok((product, counters))
}

async fn reject_counters(tx: &mut Transaction<'_, Postgres>, ids: &[Uuid]) -> ApiResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query("UPDATE counter_offers SET status = $1, updated_at = NOW() WHERE id = ANY($2)")
        .bind(ReviewStatus::Rejected)
        .bind(ids)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
