//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::config::Config;
use crate::loan::LoanService;
use crate::messaging::MessageService;
use crate::offer::OfferService;
use crate::product_offer::ProductOfferService;
use crate::profile::ProfileService;
use crate::repayment::RepaymentService;
use crate::services::DashboardService;
use crate::storage::StorageService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub loan_service: Arc<LoanService>,
    pub offer_service: Arc<OfferService>,
    pub repayment_service: Arc<RepaymentService>,
    pub product_offer_service: Arc<ProductOfferService>,
    pub message_service: Arc<MessageService>,
    pub storage_service: Arc<StorageService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    /// Build every service over one pool
    pub fn new(db_pool: PgPool, config: &Config) -> Self {
        let profile_service = ProfileService::new(db_pool.clone());

        Self {
            auth_service: Arc::new(AuthService::new(
                config.jwt_secret.clone(),
                profile_service.clone(),
            )),
            profile_service: Arc::new(profile_service),
            loan_service: Arc::new(LoanService::new(db_pool.clone())),
            offer_service: Arc::new(OfferService::new(db_pool.clone())),
            repayment_service: Arc::new(RepaymentService::new(db_pool.clone())),
            product_offer_service: Arc::new(ProductOfferService::new(db_pool.clone())),
            message_service: Arc::new(MessageService::new(db_pool.clone())),
            storage_service: Arc::new(StorageService::from_config(config)),
            dashboard_service: Arc::new(DashboardService::new(db_pool.clone())),
            db_pool,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
