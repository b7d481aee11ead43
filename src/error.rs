use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::services::face_api::FaceApiError;
use crate::services::storage::StorageError;

/// JSON error body returned by the API.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// Errors surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad client input (400).
    #[error("{0}")]
    BadRequest(String),

    /// The upstream image API failed or misbehaved (502).
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<String>,
        raw: Option<Value>,
    },

    /// Anything else (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "client",
            ApiError::Upstream { .. } => "upstream",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<FaceApiError> for ApiError {
    fn from(err: FaceApiError) -> Self {
        let message = err.to_string();
        match err {
            FaceApiError::Status { body, .. } => ApiError::Upstream {
                message,
                details: Some(body),
                raw: None,
            },
            FaceApiError::MissingJobId { raw } | FaceApiError::MissingResultUrl { raw } => {
                ApiError::Upstream {
                    message,
                    details: None,
                    raw: Some(raw),
                }
            }
            FaceApiError::Http(_) => ApiError::Internal(message),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        metrics::counter!("tryon_requests_failed", "kind" => self.kind()).increment(1);
        match &self {
            ApiError::BadRequest(message) => tracing::info!(error = %message, "Rejected try-on request"),
            ApiError::Upstream { message, .. } => tracing::warn!(error = %message, "Upstream failure"),
            ApiError::Internal(message) => tracing::error!(error = %message, "Internal error"),
        }

        let body = match self {
            ApiError::BadRequest(error) | ApiError::Internal(error) => ErrorResponse {
                error,
                details: None,
                raw: None,
            },
            ApiError::Upstream {
                message,
                details,
                raw,
            } => ErrorResponse {
                error: message,
                details,
                raw,
            },
        };

        (status, Json(body)).into_response()
    }
}
