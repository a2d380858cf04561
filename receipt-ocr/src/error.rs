//! Error types for receipt-ocr
//!
//! Every failure is rendered as `{"error": "..."}`. Internal causes are
//! logged where they occur; the client only sees the generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{FanOutError, IngestError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or rejected credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Duplicate record (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::NoImages => ApiError::BadRequest("Invalid request format".to_string()),
            IngestError::InvalidImage { index, .. } => {
                ApiError::BadRequest(format!("Invalid image data at index {}", index))
            }
            IngestError::FanOut(FanOutError::DeadlineExceeded(_)) => {
                ApiError::Internal("OCR processing timed out".to_string())
            }
            IngestError::FanOut(_) => ApiError::Internal("OCR processing failed".to_string()),
            IngestError::Normalize { .. } => {
                ApiError::Internal("Failed to parse OCR result".to_string())
            }
            IngestError::Conflict { rnames } => {
                ApiError::Conflict(format!("Record already exists: {}", rnames.join(", ")))
            }
            IngestError::Storage(_) => ApiError::Internal("Failed to save data".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unauthorized(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ProviderError;
    use std::time::Duration;

    #[test]
    fn test_ingest_error_mapping() {
        let cases = [
            (IngestError::NoImages, StatusCode::BAD_REQUEST),
            (
                IngestError::InvalidImage { index: 2, reason: "bad".into() },
                StatusCode::BAD_REQUEST,
            ),
            (
                IngestError::FanOut(FanOutError::Provider {
                    index: 0,
                    source: ProviderError::Network("reset".into()),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                IngestError::FanOut(FanOutError::DeadlineExceeded(Duration::from_secs(30))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                IngestError::Conflict { rnames: vec!["2024-03-1ACME Mart".into()] },
                StatusCode::CONFLICT,
            ),
            (IngestError::Storage("timeout".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_internal_cause_not_leaked() {
        let api = ApiError::from(IngestError::Storage("disk I/O error at /var/db".into()));
        match api {
            ApiError::Internal(msg) => assert_eq!(msg, "Failed to save data"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
