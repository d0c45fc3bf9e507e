//! Common error type and alias.
//!
//! Every failure in the service funnels into [`AppError`]. Handlers return it
//! directly; the `IntoResponse` impl logs the full detail and hands the client
//! only a generic, human-readable message.
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

pub const GENERIC_FAILURE: &str = "Failed to generate image, please try again";
pub const TIMEOUT_FAILURE: &str = "Generation timed out, please try again";
pub const MODEL_LOADING: &str = "Model is loading, please try again in a moment";
pub const INVALID_PIN: &str = "Invalid PIN";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid or missing PIN")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("model is still loading on the inference backend")]
    ModelLoading,

    #[error("job did not complete within {0:?}")]
    Timeout(Duration),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("notification channel error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed backend response: {0}")]
    InvalidResponse(String),

    #[error("prompt construction failed: {0}")]
    PromptConstruction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ModelLoading => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert a client error, reporting an elapsed request deadline as `Timeout`.
    pub fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            AppError::Timeout(timeout)
        } else {
            AppError::HttpClient(e)
        }
    }

    /// Message that is safe to show to the client. Backend detail never leaks.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized => INVALID_PIN.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::ModelLoading => MODEL_LOADING.to_string(),
            AppError::Timeout(_) => TIMEOUT_FAILURE.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_detail_is_never_public() {
        let err = AppError::Backend("CUDA out of memory at node 6".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), GENERIC_FAILURE);

        let err = AppError::InvalidResponse("missing prompt_id".to_string());
        assert!(!err.public_message().contains("prompt_id"));
    }

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthorized.public_message(), "Invalid PIN");
        assert_eq!(
            AppError::BadRequest("No image uploaded".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::ModelLoading.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(AppError::ModelLoading.public_message().starts_with("Model is loading"));

        let timeout = AppError::Timeout(Duration::from_secs(120));
        assert_eq!(timeout.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.public_message(), TIMEOUT_FAILURE);
    }
}
