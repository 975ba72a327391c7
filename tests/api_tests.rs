//! Router-level tests that never reach the database

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use lendbarter_server::app::build_router;
use lendbarter_server::auth::issue_token;
use lendbarter_server::config::{Config, Environment};
use lendbarter_server::middleware::RateLimiter;
use lendbarter_server::state::AppState;

const SECRET: &str = "api-test-secret";

fn test_config() -> Config {
    Config {
        database_url: "postgresql://localhost/lendbarter_unreachable".to_string(),
        environment: Environment::Development,
        port: 0,
        db_max_connections: 1,
        run_migrations: false,
        rate_limit_rps: 1000,
        cors_allowed_origins: None,
        log_level: "warn".to_string(),
        jwt_secret: SECRET.to_string(),
        storage_public_url: "http://storage.test/public".to_string(),
        storage_bucket: "product-images".to_string(),
    }
}

fn test_app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let state = AppState::new(pool, &config);
    build_router(state, &config, RateLimiter::new(config.rate_limit_rps))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_banner() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"LendBarter Marketplace API Server");
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/loans")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/messages")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let token = issue_token(Uuid::new_v4(), None, "someone-else", 3600).unwrap();

    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/profiles/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_reported() {
    let token = issue_token(Uuid::new_v4(), None, SECRET, -3600).unwrap();

    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/offers/{}/accept", Uuid::new_v4()))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-request-id").unwrap(), "req-123");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/no-such-route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
