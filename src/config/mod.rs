//! Configuration for the marketplace server
//!
//! Every setting comes from an environment variable. `.env` is honoured in
//! development. Values are resolved through a lookup function so tests can
//! supply their own variables without touching the process environment.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "ENVIRONMENT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection URL (`DATABASE_URL`)
    pub database_url: String,
    pub environment: Environment,
    /// Listen port (`PORT`, default 3001)
    pub port: u16,
    /// Pool size (`DB_MAX_CONNECTIONS`, default 5)
    pub db_max_connections: u32,
    /// Apply embedded migrations at startup (`RUN_MIGRATIONS`, default true)
    pub run_migrations: bool,
    /// Sustained requests per second per client (`RATE_LIMIT_RPS`, default 100)
    pub rate_limit_rps: u32,
    /// Comma separated origins; permissive CORS when unset
    pub cors_allowed_origins: Option<String>,
    /// Fallback filter when `RUST_LOG` is not a valid directive
    pub log_level: String,
    /// Shared secret the auth provider signs session tokens with
    pub jwt_secret: String,
    /// Public base URL of the object storage provider
    pub storage_public_url: String,
    /// Bucket holding product images
    pub storage_bucket: String,
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn flag_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        },
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = parse_or(&lookup, "ENVIRONMENT", Environment::Development)?;

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let jwt_secret = match lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            None => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Config {
            database_url,
            environment,
            port: parse_or(&lookup, "PORT", 3001)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            run_migrations: flag_or(&lookup, "RUN_MIGRATIONS", true)?,
            rate_limit_rps: parse_or(&lookup, "RATE_LIMIT_RPS", 100)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS"),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            jwt_secret,
            storage_public_url: lookup("STORAGE_PUBLIC_URL").unwrap_or_else(|| {
                "http://localhost:54321/storage/v1/object/public".to_string()
            }),
            storage_bucket: lookup("STORAGE_BUCKET")
                .unwrap_or_else(|| "product-images".to_string()),
        })
    }

    /// `DATABASE_URL` with its password replaced, safe to log
    pub fn database_url_masked(&self) -> String {
        let url = &self.database_url;
        let Some(at) = url.find('@') else {
            return url.clone();
        };
        let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
        match url[scheme_end..at].find(':') {
            Some(colon) => format!("{}****{}", &url[..scheme_end + colon + 1], &url[at..]),
            None => url.clone(),
        }
    }
}
