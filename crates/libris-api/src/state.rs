//! Application state shared across all handlers.

use std::sync::Arc;

use libris_auth::jwt::{JwtDecoder, JwtEncoder};
use libris_auth::password::PasswordHasher;
use libris_auth::rbac::RbacEnforcer;
use libris_core::config::AppConfig;
use libris_entity::store::{IdentityStore, LendingStore};
use libris_service::{CatalogService, IdentityService, ReservationEngine};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks. The stores arrive as
/// trait objects, so the same state type wires up PostgreSQL in
/// production and the in-memory stores in tests.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// JWT token decoder and validator.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Lending store, used directly for health checks.
    pub lending_store: Arc<dyn LendingStore>,
    /// Identity service.
    pub identity_service: Arc<IdentityService>,
    /// Catalog service.
    pub catalog_service: Arc<CatalogService>,
    /// Reservation engine.
    pub reservation_engine: Arc<ReservationEngine>,
}

impl AppState {
    /// Wires up the full service graph over the given stores.
    pub fn new(
        config: Arc<AppConfig>,
        identity_store: Arc<dyn IdentityStore>,
        lending_store: Arc<dyn LendingStore>,
    ) -> Self {
        let hasher = Arc::new(PasswordHasher::new());
        let encoder = Arc::new(JwtEncoder::new(&config.auth));
        let decoder = Arc::new(JwtDecoder::new(&config.auth));
        let enforcer = Arc::new(RbacEnforcer::new());

        let identity_service = Arc::new(IdentityService::new(
            identity_store,
            hasher,
            encoder,
            enforcer.clone(),
            config.auth.password_min_length,
        ));
        let catalog_service = Arc::new(CatalogService::new(
            lending_store.clone(),
            enforcer.clone(),
        ));
        let reservation_engine = Arc::new(ReservationEngine::new(
            lending_store.clone(),
            enforcer,
            config.lending.loan_period_days,
        ));

        Self {
            config,
            jwt_decoder: decoder,
            lending_store,
            identity_service,
            catalog_service,
            reservation_engine,
        }
    }
}
