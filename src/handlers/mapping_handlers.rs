use crate::{
    error::ApiError,
    models::{MappingSelection, ScoringScale},
    AppState,
};
use axum::{extract::State, response::Json};

/// GET /api/mappings - ISO controls with their NIST CSF subcategories
pub async fn list_mappings(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<MappingSelection>>, ApiError> {
    let mappings = app_state
        .mapping_service
        .list_mappings_for_selection()
        .await?;
    Ok(Json(mappings))
}

/// GET /api/scoring - Likelihood/impact labels and severity bands
pub async fn get_scoring_scale() -> Json<ScoringScale> {
    Json(ScoringScale::standard())
}
