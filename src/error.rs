use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Malformed date: {0}")]
    Date(String),

    #[error("Warehouse query failed: {0}")]
    Warehouse(#[from] sqlx::Error),

    #[error("Object storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

// Validation errors are the caller's fault; everything else surfaces as an
// opaque server error with a free-text detail string.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
