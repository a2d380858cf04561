//! Bearer token authentication middleware
//!
//! Resolves `Authorization: Bearer <token>` to an [`Identity`] and stores it
//! in the request extensions. Handlers behind this layer read it with
//! `Extension<Identity>`. Requests that fail here never reach a handler.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use receipt_common::auth::{extract_bearer, TokenError};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::Unauthorized("invalid authorization header format".to_string()))?,
        ),
        None => None,
    };

    let token = extract_bearer(header).map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let claims = state.authority.verify(token).map_err(|e| {
        warn!(error = %e, path = %request.uri().path(), "Token rejected");
        match e {
            TokenError::Expired { .. } => ApiError::Unauthorized("token expired".to_string()),
            _ => ApiError::Unauthorized("invalid token".to_string()),
        }
    })?;

    debug!(uid = %claims.account.uid, "Request authenticated");
    request.extensions_mut().insert(claims.account);

    Ok(next.run(request).await)
}
