//! Postgres pool, embedded migrations and the health probe

use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::Config;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("could not open a pool to {url}")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("migrations failed")]
    Migrate(#[from] MigrateError),

    #[error("database is not answering")]
    Unhealthy(#[source] sqlx::Error),
}

pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    let url = config.database_url_masked();
    tracing::info!(database = %url, max_connections = config.db_max_connections, "Opening database pool");

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .map_err(|source| DbError::Connect { url, source })
}

/// Apply the migrations compiled into the binary
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}

pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
        .map_err(DbError::Unhealthy)
}

/// Turn optional 1-based `page` and `limit` into an `(offset, limit)` pair for SQL
pub fn page_window(page: Option<u32>, limit: Option<u32>) -> (i64, i64) {
    let page = i64::from(page.unwrap_or(1).max(1));
    let limit = i64::from(limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE));
    ((page - 1) * limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None), (0, 20));
    }

    #[test]
    fn test_page_window_clamps() {
        assert_eq!(page_window(Some(0), Some(0)), (0, 1));
        assert_eq!(page_window(Some(3), Some(500)), (200, 100));
        assert_eq!(page_window(Some(2), Some(10)), (10, 10));
    }
}
