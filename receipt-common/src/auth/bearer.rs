//! `Authorization: Bearer <token>` header parsing

use thiserror::Error;

/// Bearer header errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BearerError {
    #[error("authorization header is required")]
    MissingHeader,

    #[error("invalid authorization header format")]
    MalformedHeader,
}

/// Extract the raw token from an `Authorization` header value.
///
/// The value must be exactly two single-space separated parts with the
/// case-sensitive scheme `Bearer`. An absent or empty header is
/// `MissingHeader`.
///
/// # Examples
///
/// ```
/// use receipt_common::auth::{extract_bearer, BearerError};
///
/// assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
/// assert_eq!(extract_bearer(None), Err(BearerError::MissingHeader));
/// assert_eq!(extract_bearer(Some("Basic abc")), Err(BearerError::MalformedHeader));
/// ```
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, BearerError> {
    let value = match header_value {
        Some(v) if !v.is_empty() => v,
        _ => return Err(BearerError::MissingHeader),
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(BearerError::MalformedHeader),
    }
}
