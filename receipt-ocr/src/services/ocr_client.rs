//! OCR provider client
//!
//! One recognition request per image: a JSON document carrying the API
//! version, a generated request ID, the unix timestamp, the language tag
//! and a single image descriptor. The provider answers with the nested
//! receipt document consumed by [`crate::services::normalizer`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Header carrying the provider secret
pub const SECRET_HEADER: &str = "X-OCR-SECRET";

/// Descriptor name the provider expects for receipt images
const IMAGE_NAME: &str = "receipt";

/// Provider call errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider response is not JSON: {0}")]
    InvalidBody(String),
}

/// Image descriptor inside a recognition request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrImage {
    /// Format tag, e.g. `png` or `jpg`
    pub format: String,
    /// Base64-encoded image bytes
    pub data: String,
    pub name: String,
}

impl OcrImage {
    pub fn new(format: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            data: data.into(),
            name: IMAGE_NAME.to_string(),
        }
    }
}

/// Recognition request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrRequest {
    pub version: String,
    pub request_id: String,
    /// Unix seconds, as text
    pub timestamp: String,
    pub lang: String,
    pub images: Vec<OcrImage>,
}

impl OcrRequest {
    /// Build a single-image request with a fresh request ID
    pub fn new(version: &str, lang: &str, image: OcrImage) -> Self {
        Self {
            version: version.to_string(),
            request_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp().to_string(),
            lang: lang.to_string(),
            images: vec![image],
        }
    }
}

/// Raw provider answer for one submitted image
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecognition {
    /// Position of the image in the submitted list
    pub index: usize,
    /// Request ID sent with the recognition request
    pub request_id: String,
    pub document: Value,
}

/// External recognition provider
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Submit one recognition request and return the provider's JSON answer
    async fn recognize(&self, request: &OcrRequest) -> Result<Value, ProviderError>;
}

/// HTTPS client for the receipt OCR provider
pub struct ClovaOcrClient {
    http_client: reqwest::Client,
    url: String,
    secret_key: String,
}

impl ClovaOcrClient {
    /// `timeout` bounds each HTTP exchange; the fan-out deadline still
    /// applies on top of it.
    pub fn new(
        url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("receipt-ocr/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl OcrProvider for ClovaOcrClient {
    async fn recognize(&self, request: &OcrRequest) -> Result<Value, ProviderError> {
        tracing::debug!(request_id = %request.request_id, "Submitting OCR request");

        let response = self
            .http_client
            .post(&self.url)
            .header(SECRET_HEADER, &self.secret_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::InvalidBody(e.to_string()))
    }
}
