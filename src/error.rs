use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Response and validation messages shared between handlers and tests.
pub mod msg {
    pub const INVALID_SIGNATURE: &str = "Invalid signature";
    pub const MISSING_USER_ID: &str = "Missing user_id";
    pub const INVALID_USER_ID: &str = "Invalid user_id";
    pub const MISSING_EMAIL: &str = "Missing email";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";
    pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
    pub const INVALID_WEBHOOK_SECRET: &str = "Webhook secret cannot key an HMAC";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: bad or missing webhook signature")]
    Authentication,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Tier mapping failed: {0}")]
    Mapping(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Authentication => {
                (StatusCode::UNAUTHORIZED, msg::INVALID_SIGNATURE.to_string(), None)
            }
            AppError::Validation(reason) => (StatusCode::BAD_REQUEST, reason.clone(), None),
            AppError::Mapping(reason) => {
                tracing::error!("Tier mapping failed: {}", reason);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::INTERNAL_SERVER_ERROR.to_string(), None)
            }
            AppError::Store(reason) => {
                tracing::error!("Store error: {}", reason);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::INTERNAL_SERVER_ERROR.to_string(), None)
            }
            AppError::Directory(reason) => {
                tracing::error!("Directory error: {}", reason);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::INTERNAL_SERVER_ERROR.to_string(), None)
            }
            AppError::Config(reason) => {
                tracing::error!("Configuration error: {}", reason);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::INTERNAL_SERVER_ERROR.to_string(), None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON".to_string(), Some(e.to_string()))
            }
        };

        let body = ErrorResponse { error, details };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
