//! Application error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// The API key for a service is absent from the environment.
    /// A configuration failure, distinct from any network or backend error.
    #[error("missing API key {key} from environment for service '{service}'")]
    MissingCredential { service: String, key: String },

    /// No service identifier was supplied
    #[error("service is required")]
    MissingService,

    /// The requested service is not present in the registry
    #[error("service '{0}' is not registered")]
    ServiceNotFound(String),

    /// No model is configured for the requested (service, modality) pair
    #[error("no {modality} model configured for service '{service}'")]
    UnsupportedModel { service: String, modality: String },

    /// The prompt is missing or empty
    #[error("prompt is required")]
    InvalidPrompt,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience result type
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingService
            | AppError::ServiceNotFound(_)
            | AppError::UnsupportedModel { .. }
            | AppError::InvalidPrompt => StatusCode::BAD_REQUEST,
            AppError::MissingCredential { .. } | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
