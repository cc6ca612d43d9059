use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use crate::{database, error::ApiError, AppState};

/// Minimal liveness probe used by the browser UI and load balancers
pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Health check with database connectivity and register size
pub async fn health_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = check_database_health(&app_state).await;

    if !database["healthy"].as_bool().unwrap_or(false) {
        return Err(ApiError::internal("Service is unhealthy"));
    }

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "risk-register",
        "checks": {
            "database": database
        }
    })))
}

/// Readiness check: ready once the store answers queries
pub async fn readiness_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = check_database_health(&app_state).await;

    if !database["healthy"].as_bool().unwrap_or(false) {
        return Err(ApiError::internal("Service is not ready"));
    }

    Ok(Json(json!({
        "ready": true,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "checks": {
            "database": database
        }
    })))
}

/// Liveness check
pub async fn liveness_check() -> Json<Value> {
    Json(json!({
        "alive": true,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn check_database_health(app_state: &AppState) -> Value {
    if let Err(e) = database::health_check(&app_state.db_pool).await {
        tracing::error!("Database health check failed: {}", e);
        return json!({
            "healthy": false,
            "message": "Database connection failed",
            "error": e.to_string()
        });
    }

    match app_state.risk_repository.count().await {
        Ok(risk_count) => json!({
            "healthy": true,
            "message": "Database connection successful",
            "risk_count": risk_count
        }),
        Err(e) => {
            tracing::error!("Risk count during health check failed: {}", e);
            json!({
                "healthy": false,
                "message": "Risk store unreadable",
                "error": e.to_string()
            })
        }
    }
}
