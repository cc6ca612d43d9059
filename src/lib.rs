use std::sync::Arc;
use axum::{
    routing::get,
    Router,
};
use crate::{
    config::Settings,
    database::DatabasePool,
    error::ApiError,
    repositories::{MappingRepository, RiskRepository, SqlxMappingRepository, SqlxRiskRepository},
    services::{MappingService, RiskService},
};

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

/// Shared application state. The store handle is created once at startup
/// and injected into every repository.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabasePool,
    pub risk_repository: Arc<dyn RiskRepository + Send + Sync>,
    pub risk_service: Arc<RiskService>,
    pub mapping_service: Arc<MappingService>,
}

impl AppState {
    /// Create new application state, opening the configured database
    pub async fn new(config: &Settings) -> Result<Self, ApiError> {
        let db_pool = crate::database::create_connection_pool(
            &config.database_url,
            config.database_max_connections,
        )
        .await?;
        Ok(Self::new_with_pool(db_pool))
    }

    /// Create new application state with existing database pool
    pub fn new_with_pool(db_pool: DatabasePool) -> Self {
        let risk_repository: Arc<dyn RiskRepository + Send + Sync> =
            Arc::new(SqlxRiskRepository::new(db_pool.clone()));
        let mapping_repository: Arc<dyn MappingRepository + Send + Sync> =
            Arc::new(SqlxMappingRepository::new(db_pool.clone()));

        let risk_service = Arc::new(RiskService::new(risk_repository.clone()));
        let mapping_service = Arc::new(MappingService::new(mapping_repository));

        Self {
            db_pool,
            risk_repository,
            risk_service,
            mapping_service,
        }
    }
}

/// API and health routes. Static files and global layers are added by the binary.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        // Health check endpoints
        .route("/healthz", get(handlers::healthz))
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/ready", get(handlers::readiness_check))
        .route("/api/health/live", get(handlers::liveness_check))
        // Risk endpoints
        .route(
            "/api/risks",
            get(handlers::risk_handlers::list_risks).post(handlers::risk_handlers::create_risk),
        )
        .route("/api/risks/export.csv", get(handlers::risk_handlers::export_risks_csv))
        .route("/api/risks/:id", get(handlers::risk_handlers::get_risk))
        // Mapping endpoints
        .route("/api/mappings", get(handlers::mapping_handlers::list_mappings))
        .route("/api/scoring", get(handlers::mapping_handlers::get_scoring_scale))
        .with_state(app_state)
}
