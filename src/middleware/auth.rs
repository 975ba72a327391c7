//! Authentication extractors
//!
//! Verify the bearer token on each request and hand the caller to handlers
//! as an explicit value.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthService, JwtError, Session};
use crate::models::{Actor, Profile, UserRole};

/// Caller with a verified session and a marketplace profile
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

/// Caller with a verified session who may not have a profile yet
#[derive(Debug, Clone)]
pub struct SessionUser(pub Session);

/// JSON rejection in the same `{error: {code, message}}` shape as `ApiError`
fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    let body = json!({ "error": { "code": code, "message": message, "retryable": false } });
    (status, Json(body)).into_response()
}

async fn session_from_parts<S>(parts: &mut Parts, state: &S) -> Result<Session, Response>
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                reject(
                    StatusCode::UNAUTHORIZED,
                    "MISSING_TOKEN",
                    "Authorization header with Bearer token required",
                )
            })?;

    let auth_service = Arc::<AuthService>::from_ref(state);

    auth_service.verify_session(bearer.token()).map_err(|e| {
        let (code, message) = match e {
            JwtError::TokenExpired => ("TOKEN_EXPIRED", "Token has expired"),
            _ => ("INVALID_TOKEN", "Invalid token"),
        };
        reject(StatusCode::UNAUTHORIZED, code, message)
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        session_from_parts(parts, state).await.map(SessionUser)
    }
}

/// Extractor for authenticated users with a profile
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        let auth_service = Arc::<AuthService>::from_ref(state);

        let profile: Profile = match auth_service.resolve_profile(&session).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                return Err(reject(
                    StatusCode::FORBIDDEN,
                    "PROFILE_REQUIRED",
                    "Create a profile before using the marketplace",
                ))
            }
            Err(e) => return Err(e.into_response()),
        };

        Ok(AuthenticatedUser {
            user_id: session.user_id,
            email: session.email,
            role: profile.role,
        })
    }
}
