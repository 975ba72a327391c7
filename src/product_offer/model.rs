//! Product offer and counter offer models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::TransitionError;

/// Status shared by product offers and counter offers
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn transition(
        self,
        entity: &'static str,
        next: ReviewStatus,
    ) -> Result<ReviewStatus, TransitionError> {
        match (self, next) {
            (ReviewStatus::Pending, ReviewStatus::Accepted)
            | (ReviewStatus::Pending, ReviewStatus::Rejected) => Ok(next),
            _ => Err(TransitionError::InvalidTransition {
                entity,
                from: self.as_str(),
                to: next.as_str(),
            }),
        }
    }
}

/// Product category
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ProductCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Good offered by a borrower as collateral or part repayment
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ProductOffer {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub borrower_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub specifications: Option<String>,
    pub age: Option<String>,
    pub amount: i64,
    pub image_url: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rival valuation bid against a product offer
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct CounterOffer {
    pub id: Uuid,
    pub product_offer_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub message: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to put a product up against a loan
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductOfferRequest {
    pub category_id: Uuid,
    #[validate(
        length(min = 1, max = 200, message = "Title is required"),
        custom(function = "crate::models::not_blank", message = "Title is required")
    )]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(max = 4000))]
    pub specifications: Option<String>,
    #[validate(length(max = 100))]
    pub age: Option<String>,
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Request to bid a different valuation
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCounterOfferRequest {
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// Lender's verdict on a product offer
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Accept,
    Reject,
}

impl ReviewDecision {
    pub fn target(self) -> ReviewStatus {
        match self {
            ReviewDecision::Accept => ReviewStatus::Accepted,
            ReviewDecision::Reject => ReviewStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewProductOfferRequest {
    pub decision: ReviewDecision,
}

/// Product offer together with its counter offers
#[derive(Debug, Serialize)]
pub struct ProductOfferDetail {
    #[serde(flatten)]
    pub product_offer: ProductOffer,
    pub counter_offers: Vec<CounterOffer>,
}

/// Outcome of accepting a counter offer
#[derive(Debug, Serialize)]
pub struct CounterAcceptance {
    pub counter_offer: CounterOffer,
    pub product_offer: ProductOffer,
    pub rejected_counter_ids: Vec<Uuid>,
    pub already_accepted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> CreateProductOfferRequest {
        CreateProductOfferRequest {
            category_id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            specifications: None,
            age: None,
            amount: 800,
            image_url: None,
        }
    }

    #[test]
    fn test_title_must_have_text() {
        assert!(request("Diesel generator").validate().is_ok());
        assert!(request("").validate().is_err());
        assert!(request("    ").validate().is_err());
    }
}
