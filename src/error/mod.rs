//! Centralized API error handling for the marketplace server
//!
//! `ApiError` is the single failure type every service call returns. It maps
//! onto HTTP status codes and a JSON error body. `TransitionError` is what the
//! pure negotiation rules produce; it converts into `ApiError` at the service
//! boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Postgres SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Failure of an API operation
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Service temporarily unavailable")]
    ServiceUnavailable(String),

    /// Unexpected database failure; the detail is logged, never returned
    #[error("Database error")]
    DatabaseError(String),

    #[error("{0}")]
    ValidationError(String),
}

/// JSON error body: `{ "error": { code, message, retryable } }`
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Serialize)]
struct ErrorDetails {
    code: &'static str,
    message: String,
    retryable: bool,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.parts().1
    }

    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::ServiceUnavailable(_) | ApiError::TooManyRequests
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();

        match &self {
            ApiError::DatabaseError(detail) | ApiError::ServiceUnavailable(detail) => {
                tracing::error!(code, detail = %detail, "Request failed on the server");
            }
            other => {
                tracing::debug!(code, error = %other, "Request refused");
            }
        }

        let body = ErrorBody {
            error: ErrorDetails {
                code,
                message: self.to_string(),
                retryable: self.is_retryable(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            sqlx::Error::Database(ref db_err) => match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    ApiError::Conflict("Concurrent update detected, reload and retry".to_string())
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    ApiError::ValidationError("Referenced record does not exist".to_string())
                }
                _ => ApiError::DatabaseError(err.to_string()),
            },
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", err))
    }
}

/// Violation of a negotiation rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotPermitted(String),

    #[error("{0} not found")]
    Missing(&'static str),
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { .. } | TransitionError::Conflict(_) => {
                ApiError::Conflict(err.to_string())
            }
            TransitionError::NotPermitted(msg) => ApiError::Forbidden(msg),
            TransitionError::Missing(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (
                ApiError::ValidationError("x".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (ApiError::TooManyRequests, StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS"),
            (
                ApiError::DatabaseError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn test_database_detail_is_not_exposed() {
        let err = ApiError::DatabaseError("relation \"loans\" does not exist".to_string());
        assert_eq!(err.to_string(), "Database error");
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(ApiError::ServiceUnavailable("pool".to_string()).is_retryable());
        assert!(ApiError::TooManyRequests.is_retryable());
        assert!(!ApiError::Conflict("race".to_string()).is_retryable());
    }

    #[test]
    fn test_sqlx_error_mapping() {
        let err: ApiError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));

        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_transition_error_mapping() {
        let err: ApiError = TransitionError::InvalidTransition {
            entity: "offer",
            from: "rejected",
            to: "accepted",
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "offer cannot move from rejected to accepted");

        let err: ApiError = TransitionError::NotPermitted("borrower only".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err: ApiError = TransitionError::Missing("offer").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
