use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use risk_register::{
    config::Settings, create_router, database, services::builtin_catalogue, AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Settings for tests; environment and `.env` are not consulted.
pub fn test_settings() -> Settings {
    Settings {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        host: "127.0.0.1".to_string(),
        port: 3000,
        static_dir: "public".to_string(),
        cors_allow_origins: vec!["*".to_string()],
        log_level: "error".to_string(),
        log_format: "plain".to_string(),
        seed_mappings_on_startup: false,
    }
}

/// Application state over a fresh in-memory database
#[allow(dead_code)]
pub async fn create_test_state(seed_catalogue: bool) -> AppState {
    let settings = test_settings();
    let pool = database::create_connection_pool(&settings.database_url, 1)
        .await
        .expect("Failed to create database pool");

    let app_state = AppState::new_with_pool(pool);
    if seed_catalogue {
        app_state
            .mapping_service
            .load_catalogue(&builtin_catalogue())
            .await
            .expect("Failed to seed mappings");
    }
    app_state
}

/// Router over a fresh in-memory database seeded with the built-in catalogue
#[allow(dead_code)]
pub async fn create_test_app() -> Router {
    create_router(create_test_state(true).await)
}

/// Helper to extract response body as bytes
pub async fn extract_body(response: axum::response::Response) -> Vec<u8> {
    use axum::body::to_bytes;
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    body.to_vec()
}

#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn post_json(app: &Router, uri: &str, payload: &Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .method(Method::POST)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> Value {
    serde_json::from_slice(&extract_body(response).await).unwrap()
}

#[allow(dead_code)]
/// Helper to validate datetime string format
pub fn is_valid_datetime_string(datetime_str: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(datetime_str).is_ok()
}
