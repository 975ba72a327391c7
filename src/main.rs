//! LendBarter Marketplace Server
//!
//! HTTP API for peer-to-peer loans, offer and repayment negotiation,
//! product barter and member messaging.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;

use lendbarter_server::app::build_router;
use lendbarter_server::config::Config;
use lendbarter_server::db;
use lendbarter_server::middleware::RateLimiter;
use lendbarter_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        port = config.port,
        "Starting marketplace server"
    );

    let db_pool = db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected successfully");

    if config.run_migrations {
        db::run_migrations(&db_pool)
            .await
            .context("Failed to run migrations")?;
    }

    let app_state = AppState::new(db_pool, &config);

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    let _eviction = rate_limiter.spawn_eviction(Duration::from_secs(60));

    let app = build_router(app_state, &config, rate_limiter);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
