//! Loan service layer - business logic for loan management

use sqlx::PgPool;
use uuid::Uuid;

use super::model::{
    settles, CreateLoanRequest, ListLoansQuery, Loan, LoanStatus, Payment, PaymentReceipt,
    RecordPaymentRequest,
};
use crate::db::page_window;
use crate::error::{ApiError, ApiResult, TransitionError};
use crate::models::{Actor, UserRole};
use crate::offer::{rules as offer_rules, Offer};

/// Loan service for managing the loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
}

impl LoanService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Post a new loan request
    pub async fn create_loan(&self, actor: &Actor, request: CreateLoanRequest) -> ApiResult<Loan> {
        if actor.role != UserRole::Borrower {
            return Err(ApiError::Forbidden(
                "Only borrowers can request loans".to_string(),
            ));
        }

        let description = request.description.trim();
        if description.is_empty() {
            return Err(ApiError::ValidationError(
                "Description is required".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (borrower_id, amount, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(actor.user_id)
        .bind(request.amount)
        .bind(description)
        .bind(LoanStatus::Pending)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(loan_id = %loan.id, borrower_id = %actor.user_id, amount = loan.amount, "Loan requested");

        Ok(loan)
    }

    /// Get loan by ID
    pub async fn get_loan(&self, id: Uuid) -> ApiResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))
    }

    /// List loans with filters, newest first
    pub async fn list_loans(&self, query: ListLoansQuery) -> ApiResult<Vec<Loan>> {
        let (offset, limit) = page_window(query.page, query.limit);

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM loans WHERE 1=1");

        if let Some(borrower_id) = query.borrower_id {
            query_builder.push(" AND borrower_id = ");
            query_builder.push_bind(borrower_id);
        }
        if let Some(lender_id) = query.lender_id {
            query_builder.push(" AND lender_id = ");
            query_builder.push_bind(lender_id);
        }
        if let Some(status) = query.status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let loans = query_builder
            .build_query_as::<Loan>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(loans)
    }

    /// Withdraw a pending loan request and reject its open offers
    pub async fn cancel_loan(&self, actor: &Actor, id: Uuid) -> ApiResult<Loan> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))?;

        let offers = sqlx::query_as::<_, Offer>(
            "SELECT * FROM offers WHERE loan_id = $1 ORDER BY created_at, id FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let to_reject = offer_rules::plan_cancellation(actor.user_id, &loan, &offers)?;

        let loan = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(LoanStatus::Cancelled)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        crate::offer::reject_offers(&mut tx, &to_reject).await?;

        tx.commit().await?;

        tracing::info!(loan_id = %id, rejected_offers = to_reject.len(), "Loan cancelled");

        Ok(loan)
    }

    /// Lender confirms the loan was repaid (in cash, services or goods)
    pub async fn complete_loan(&self, actor: &Actor, id: Uuid) -> ApiResult<Loan> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))?;

        if !loan.is_lender(actor.user_id) {
            return Err(TransitionError::NotPermitted(
                "Only the lender can confirm a loan as completed".to_string(),
            )
            .into());
        }
        loan.status.transition(LoanStatus::Completed)?;

        let loan = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(LoanStatus::Completed)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %id, lender_id = %actor.user_id, "Loan completed by lender");

        Ok(loan)
    }

    /// Record a payment and complete the loan once the principal is covered
    pub async fn record_payment(
        &self,
        actor: &Actor,
        loan_id: Uuid,
        request: RecordPaymentRequest,
    ) -> ApiResult<PaymentReceipt> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", loan_id)))?;

        if !loan.is_borrower(actor.user_id) {
            return Err(ApiError::Forbidden(
                "Only the borrower can record payments".to_string(),
            ));
        }
        if loan.status != LoanStatus::Active {
            return Err(ApiError::Conflict(format!(
                "Payments can only be recorded on active loans (loan is {})",
                loan.status.as_str()
            )));
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (loan_id, payer_id, amount, note)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(actor.user_id)
        .bind(request.amount)
        .bind(request.note)
        .fetch_one(&mut *tx)
        .await?;

        let (total_paid,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payments WHERE loan_id = $1",
        )
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        let loan_status = if settles(total_paid, loan.amount) {
            sqlx::query("UPDATE loans SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(LoanStatus::Completed)
                .bind(loan_id)
                .execute(&mut *tx)
                .await?;
            LoanStatus::Completed
        } else {
            loan.status
        };

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan_id,
            amount = payment.amount,
            total_paid,
            status = loan_status.as_str(),
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            payment,
            total_paid,
            loan_status,
        })
    }

    /// Payments on a loan, visible to its borrower and lender
    pub async fn list_payments(&self, actor: &Actor, loan_id: Uuid) -> ApiResult<Vec<Payment>> {
        let loan = self.get_loan(loan_id).await?;
        if !loan.is_borrower(actor.user_id) && !loan.is_lender(actor.user_id) {
            return Err(ApiError::Forbidden(
                "Only the loan's parties can view its payments".to_string(),
            ));
        }

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE loan_id = $1 ORDER BY created_at",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(payments)
    }
}
