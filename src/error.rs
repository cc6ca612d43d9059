use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::error::ErrorKind;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a new validation error
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new constraint violation error
    pub fn constraint_violation<T: Into<String>>(msg: T) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    /// Create a new not found error
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new internal error
    pub fn internal<T: Into<String>>(msg: T) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify a store error: CHECK and NOT NULL rejections become
    /// `ConstraintViolation`, everything else stays a database failure.
    pub fn from_store(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let rejected = matches!(
                db_err.kind(),
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation
            ) || db_err.message().contains("CHECK constraint failed")
                || db_err.message().contains("NOT NULL constraint failed");
            if rejected {
                return Self::constraint_violation(db_err.message());
            }
        }
        Self::Database(err)
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::ConstraintViolation(_) => (StatusCode::BAD_REQUEST, "CONSTRAINT_VIOLATION"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Csv(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MIGRATION_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let (status, error_code) = self.status_and_code();

        // Client-facing failures echo their message; infrastructure failures stay opaque.
        let error_message = match self {
            ApiError::Validation(ref msg) => {
                tracing::warn!(error_id = %error_id, error = %msg, "validation error occurred");
                msg.clone()
            }
            ApiError::ConstraintViolation(ref msg) => {
                tracing::warn!(error_id = %error_id, error = %msg, "store rejected record");
                msg.clone()
            }
            ApiError::NotFound(ref msg) => {
                tracing::info!(error_id = %error_id, error = %msg, "resource not found");
                msg.clone()
            }
            ApiError::Database(ref err) => {
                tracing::error!(error_id = %error_id, error = %err, "database error occurred");
                "Database error".to_string()
            }
            ApiError::Migration(ref err) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %err,
                    "database migration error occurred"
                );
                "Database migration error".to_string()
            }
            ApiError::Csv(ref err) => {
                tracing::error!(error_id = %error_id, error = %err, "CSV export failed");
                "Serialization error".to_string()
            }
            ApiError::Internal(ref msg) => {
                tracing::error!(error_id = %error_id, error = %msg, "internal server error occurred");
                msg.clone()
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "code": error_code,
                "error_id": error_id,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}
