//! Receipt submission endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};
use receipt_common::Identity;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /ocr/data request body
#[derive(Debug, Deserialize)]
pub struct OcrDataRequest {
    /// Base64-encoded receipt images
    pub image: Vec<String>,
    /// Format tag applied to every image; sniffed per image when absent
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /ocr/data
///
/// Recognizes every submitted image and saves one record per image.
pub async fn submit_receipts(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<OcrDataRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload.map_err(|e| {
        warn!(uid = %identity.uid, error = %e, "Invalid request format");
        ApiError::BadRequest("Invalid request format".to_string())
    })?;

    state
        .pipeline
        .process(&identity, &request.image, request.format.as_deref())
        .await?;

    Ok(Json(MessageResponse {
        message: "data successfully processed and saved".to_string(),
    }))
}

/// Build receipt routes (protected)
pub fn ocr_routes() -> Router<AppState> {
    Router::new().route("/ocr/data", post(submit_receipts))
}
