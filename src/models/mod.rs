//! Shared data models for the marketplace server

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::ValidationError;

/// Marketplace profile, keyed by the auth provider's user id
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Borrower,
    Lender,
    Admin,
}

impl UserRole {
    /// Roles a member may pick for themselves; admin is granted out of band
    pub fn is_self_assignable(self) -> bool {
        !matches!(self, UserRole::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Borrower => "borrower",
            UserRole::Lender => "lender",
            UserRole::Admin => "admin",
        }
    }
}

/// The authenticated caller, handed explicitly to every service operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }
}

/// Request to create or update the caller's profile
#[derive(Debug, Deserialize, validator::Validate)]
pub struct UpsertProfileRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    pub role: UserRole,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// Rejects strings that are empty once surrounding whitespace is removed
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserRole::Borrower).unwrap(),
            "\"borrower\""
        );
        let role: UserRole = serde_json::from_str("\"lender\"").unwrap();
        assert_eq!(role, UserRole::Lender);
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_only_admin_is_reserved() {
        assert!(UserRole::Borrower.is_self_assignable());
        assert!(UserRole::Lender.is_self_assignable());
        assert!(!UserRole::Admin.is_self_assignable());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Generator").is_ok());
        assert!(not_blank("  x  ").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank(" \t\n ").is_err());
    }

    #[test]
    fn test_api_response_ok() {
        let response = ApiResponse::ok(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.error.is_none());
    }
}
