//! receipt-ocr library interface
//!
//! Exposes the router and services for the binaries and for integration
//! testing.

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use receipt_common::auth::TokenAuthority;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::IngestPipeline;

/// Largest accepted request body (base64 images are bulky)
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    /// Verifies bearer tokens on protected routes
    pub authority: Arc<TokenAuthority>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestPipeline>, authority: Arc<TokenAuthority>) -> Self {
        Self {
            pipeline,
            authority,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `/ocr/data` requires a bearer token; `/health` and `/ping` are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = api::ocr_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::auth_middleware,
    ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
