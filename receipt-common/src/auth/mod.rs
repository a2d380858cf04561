//! Stateless token authority
//!
//! Issues signed identity tokens and verifies them on every protected
//! request. There is no server-side session store: the identity is
//! reconstructed from the token bytes on each verification.
//!
//! # Architecture
//!
//! Tokens are signed with an RSA private key (RS256) and verified with the
//! matching public key, so any service instance holding only the public key
//! can verify tokens without being able to mint them.
//!
//! This module contains ONLY pure functions and key handling. HTTP
//! middleware lives in the service crates.

pub mod bearer;
pub mod claims;
pub mod token;

pub use bearer::{extract_bearer, BearerError};
pub use claims::{Claims, ISSUER, TOKEN_LIFETIME_SECS};
pub use token::{TokenAuthority, TokenError};
