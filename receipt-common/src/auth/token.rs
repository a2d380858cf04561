//! Token issuance and verification

use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;

use super::claims::{Claims, ISSUER};
use crate::models::Identity;
use crate::{Error, Result};

/// Only RS256 is ever accepted
const ALGORITHM: Algorithm = Algorithm::RS256;

/// Token issuance/verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The authority holds no key for the requested operation
    #[error("signing key not available")]
    KeyUnavailable,

    #[error("failed to sign token: {0}")]
    SigningFailure(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Bad signature, wrong algorithm, wrong key pair or foreign issuer
    #[error("invalid token signature: {0}")]
    SignatureInvalid(String),

    #[error("token expired at {expired_at}")]
    Expired { expired_at: i64 },
}

/// Read `alg` from the JOSE header as a plain string
///
/// Returns `None` when the header segment is not base64url JSON with a
/// string `alg`; `decode` then reports the token as malformed.
fn header_algorithm(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("alg")?.as_str().map(str::to_string)
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidIssuer => TokenError::SignatureInvalid(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => TokenError::KeyUnavailable,
            _ => TokenError::MalformedToken(err.to_string()),
        }
    }
}

/// Process-wide token authority
///
/// Constructed once at startup and shared by reference (`Arc`). Read-only
/// after construction, so concurrent use needs no synchronization.
///
/// A verifier-only authority (public key only) can verify tokens but every
/// `issue` call fails with [`TokenError::KeyUnavailable`].
#[derive(Clone)]
pub struct TokenAuthority {
    signing_key: Option<EncodingKey>,
    verifying_key: DecodingKey,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("can_issue", &self.can_issue())
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Build an authority that can both issue and verify
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| Error::Config(format!("Failed to parse private key: {}", e)))?;
        let mut authority = Self::verifier_from_pem(public_pem)?;
        authority.signing_key = Some(signing_key);
        Ok(authority)
    }

    /// Build a verify-only authority from a public key
    pub fn verifier_from_pem(public_pem: &[u8]) -> Result<Self> {
        let verifying_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| Error::Config(format!("Failed to parse public key: {}", e)))?;
        Ok(Self {
            signing_key: None,
            verifying_key,
        })
    }

    /// Load keys from PEM files. Without a private key path the authority
    /// is verify-only.
    pub fn from_files(private_key: Option<&Path>, public_key: &Path) -> Result<Self> {
        let public_pem = read_key_file(public_key)?;
        match private_key {
            Some(path) => {
                let private_pem = read_key_file(path)?;
                Self::from_pem(&private_pem, &public_pem)
            }
            None => Self::verifier_from_pem(&public_pem),
        }
    }

    /// Whether this authority holds a signing key
    pub fn can_issue(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Issue a token for an already-authenticated identity, valid for 24h
    pub fn issue(&self, identity: &Identity) -> std::result::Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, TokenError> {
        let signing_key = self.signing_key.as_ref().ok_or(TokenError::KeyUnavailable)?;

        let claims = Claims::new(identity.clone(), now.timestamp());
        encode(&Header::new(ALGORITHM), &claims, signing_key)
            .map_err(|e| TokenError::SigningFailure(e.to_string()))
    }

    /// Verify a token against the current wall clock
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature, algorithm and issuer, then check expiry against
    /// `now` with zero leeway.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against the supplied clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[ISSUER]);

        // `none` and unknown names fail header parsing inside `decode`
        if let Some(alg) = header_algorithm(token) {
            if alg != "RS256" {
                return Err(TokenError::SignatureInvalid(format!(
                    "algorithm {} not accepted",
                    alg
                )));
            }
        }

        let data = decode::<Claims>(token, &self.verifying_key, &validation)?;
        let claims = data.claims;

        if !claims.is_live_at(now.timestamp()) {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
            });
        }

        Ok(claims)
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::Config(format!("Failed to read key file {}: {}", path.display(), e)))
}
