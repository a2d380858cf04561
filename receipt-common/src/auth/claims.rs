//! Token payload

use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// Issuer claim written into and required from every token
pub const ISSUER: &str = "fullstackproject";

/// Fixed token lifetime (24 hours)
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Signed token payload
///
/// Wire shape: `{"accounts": {...}, "iss": "...", "iat": <epoch>, "exp": <epoch>}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "accounts")]
    pub account: Identity,
    pub iss: String,
    /// Issued-at, Unix seconds
    pub iat: i64,
    /// Expires-at, Unix seconds
    pub exp: i64,
}

impl Claims {
    /// Build claims for `account` issued at `issued_at` (Unix seconds)
    pub fn new(account: Identity, issued_at: i64) -> Self {
        Self {
            account,
            iss: ISSUER.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        }
    }

    /// True while `now` (Unix seconds) is strictly before `exp`
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_wire_shape() {
        let claims = Claims::new(Identity::new("u1", "a@b.c", "Alice"), 1_700_000_000);
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["accounts"]["uid"], "u1");
        assert_eq!(value["accounts"]["email"], "a@b.c");
        assert_eq!(value["accounts"]["nickname"], "Alice");
        assert_eq!(value["iss"], "fullstackproject");
        assert_eq!(value["iat"], 1_700_000_000i64);
        assert_eq!(value["exp"], 1_700_000_000i64 + 86_400);
    }

    #[test]
    fn test_liveness_boundary() {
        let claims = Claims::new(Identity::new("u1", "a@b.c", "Alice"), 1000);

        assert!(claims.is_live_at(1000));
        assert!(claims.is_live_at(1000 + TOKEN_LIFETIME_SECS - 1));
        // exp itself is no longer valid
        assert!(!claims.is_live_at(1000 + TOKEN_LIFETIME_SECS));
    }
}
