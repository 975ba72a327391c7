//! Per-member dashboard summary

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::ApiResult;
use crate::loan::LoanStatus;
use crate::models::{Actor, UserRole};

/// Loans the member is party to, by status
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoanCounts {
    pub pending: i64,
    pub active: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl LoanCounts {
    pub fn from_rows(rows: &[(LoanStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                LoanStatus::Pending => counts.pending += count,
                LoanStatus::Active => counts.active += count,
                LoanStatus::Completed => counts.completed += count,
                LoanStatus::Cancelled => counts.cancelled += count,
            }
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.pending + self.active + self.completed + self.cancelled
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashboardSummary {
    pub role: UserRole,
    pub loans: LoanCounts,
    /// Open offers on the member's loans awaiting their answer
    pub offers_awaiting_response: i64,
    /// Open offers the member has made
    pub offers_made_open: i64,
    pub unread_messages: i64,
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: PgPool,
}

impl DashboardService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn summary(&self, actor: &Actor) -> ApiResult<DashboardSummary> {
        let rows: Vec<(LoanStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) FROM loans
            WHERE borrower_id = $1 OR lender_id = $1
            GROUP BY status
            "#,
        )
        .bind(actor.user_id)
        .fetch_all(&self.db_pool)
        .await?;

        let (offers_awaiting_response,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM offers o
            JOIN loans l ON l.id = o.loan_id
            WHERE l.borrower_id = $1 AND o.status IN ('pending', 'counter')
            "#,
        )
        .bind(actor.user_id)
        .fetch_one(&self.db_pool)
        .await?;

        let (offers_made_open,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM offers WHERE lender_id = $1 AND status IN ('pending', 'counter')",
        )
        .bind(actor.user_id)
        .fetch_one(&self.db_pool)
        .await?;

        let (unread_messages,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND NOT read",
        )
        .bind(actor.user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(DashboardSummary {
            role: actor.role,
            loans: LoanCounts::from_rows(&rows),
            offers_awaiting_response,
            offers_made_open,
            unread_messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_counts_from_rows() {
        let counts = LoanCounts::from_rows(&[
            (LoanStatus::Pending, 2),
            (LoanStatus::Completed, 5),
            (LoanStatus::Active, 1),
        ]);

        assert_eq!(counts.pending, 2);
        assert_eq!(counts.active, 1);
        assert_eq!(counts.completed, 5);
        assert_eq!(counts.cancelled, 0);
        assert_eq!(counts.total(), 8);
    }
}
