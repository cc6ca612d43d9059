use crate::{
    error::ApiError,
    models::{RiskCreate, RiskWithMapping},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};

/// GET /api/risks - All risks, most severe first
pub async fn list_risks(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<RiskWithMapping>>, ApiError> {
    let risks = app_state.risk_service.list_risks().await?;
    Ok(Json(risks))
}

/// GET /api/risks/:id - A single risk with its control mapping
pub async fn get_risk(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RiskWithMapping>, ApiError> {
    let risk = app_state
        .risk_service
        .get_risk(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Risk {} not found", id)))?;
    Ok(Json(risk))
}

/// POST /api/risks - Create a risk
pub async fn create_risk(
    State(app_state): State<AppState>,
    payload: Result<Json<RiskCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<RiskWithMapping>), ApiError> {
    // A body that is not a JSON object is a client error like any other
    let Json(payload) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let risk = app_state.risk_service.create_risk(payload).await?;
    Ok((StatusCode::CREATED, Json(risk)))
}

/// GET /api/risks/export.csv - Download the register as CSV
pub async fn export_risks_csv(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = app_state.risk_service.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"risk-register.csv\""),
        ],
        csv,
    ))
}
