//! Profile service layer

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Profile, UpsertProfileRequest};

/// Reads and writes marketplace profiles
#[derive(Clone)]
pub struct ProfileService {
    db_pool: PgPool,
}

impl ProfileService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Get a profile by user id
    pub async fn find_profile(&self, id: Uuid) -> ApiResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(profile)
    }

    /// Get a profile, failing with NotFound when absent
    pub async fn get_profile(&self, id: Uuid) -> ApiResult<Profile> {
        self.find_profile(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Profile {} not found", id)))
    }

    /// Create or update the profile of an authenticated user
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        request: UpsertProfileRequest,
    ) -> ApiResult<Profile> {
        if !request.role.is_self_assignable() {
            return Err(ApiError::Forbidden(format!(
                "The {} role cannot be chosen on a profile",
                request.role.as_str()
            )));
        }

        // An existing admin keeps the role whatever the request says.
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, full_name, role, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET email = COALESCE(EXCLUDED.email, profiles.email),
                full_name = COALESCE(EXCLUDED.full_name, profiles.full_name),
                role = CASE WHEN profiles.role = 'admin' THEN profiles.role ELSE EXCLUDED.role END,
                avatar_url = COALESCE(EXCLUDED.avatar_url, profiles.avatar_url),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(request.email)
        .bind(request.full_name)
        .bind(request.role)
        .bind(request.avatar_url)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(user_id = %user_id, role = profile.role.as_str(), "Profile saved");

        Ok(profile)
    }
}
