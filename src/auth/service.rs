//! Session resolution service
//!
//! Turns a bearer token into a verified session and, when the caller has
//! completed onboarding, their marketplace profile.

use uuid::Uuid;

use super::jwt::{verify_token, JwtError};
use crate::error::ApiResult;
use crate::models::Profile;
use crate::profile::ProfileService;

/// A verified session, before any profile lookup
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Verifies provider-issued tokens and resolves profiles
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    profiles: ProfileService,
}

impl AuthService {
    pub fn new(jwt_secret: String, profiles: ProfileService) -> Self {
        Self {
            jwt_secret,
            profiles,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Verify a bearer token and return the session it represents
    pub fn verify_session(&self, token: &str) -> Result<Session, JwtError> {
        let claims = verify_token(token, &self.jwt_secret)?;
        let user_id = claims.user_id()?;

        Ok(Session {
            user_id,
            email: claims.email,
        })
    }

    /// Look up the marketplace profile behind a session
    pub async fn resolve_profile(&self, session: &Session) -> ApiResult<Option<Profile>> {
        self.profiles.find_profile(session.user_id).await
    }
}
