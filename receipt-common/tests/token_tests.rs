//! Integration tests for the token authority
//!
//! Covers issue/verify round trips, expiry, cross-key forgery and
//! algorithm-substitution forgery, including unsigned and unknown
//! algorithms.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use receipt_common::auth::{Claims, TokenAuthority, TokenError, ISSUER, TOKEN_LIFETIME_SECS};
use receipt_common::Identity;

const SIGNING_PEM: &[u8] = include_bytes!("fixtures/keys/signing.pem");
const VERIFY_PEM: &[u8] = include_bytes!("fixtures/keys/verify.pem");
const OTHER_SIGNING_PEM: &[u8] = include_bytes!("fixtures/keys/other_signing.pem");
const OTHER_VERIFY_PEM: &[u8] = include_bytes!("fixtures/keys/other_verify.pem");

fn authority() -> TokenAuthority {
    TokenAuthority::from_pem(SIGNING_PEM, VERIFY_PEM).expect("fixture keys should load")
}

fn identities() -> Vec<Identity> {
    vec![
        Identity::new("665f1c2e9b1d", "kim@example.com", "kim"),
        Identity::new("", "", ""),
        Identity::new("uid with spaces", "ünïcødé@example.com", "이름"),
    ]
}

#[test]
fn test_verify_returns_issued_identity() {
    let authority = authority();

    for identity in identities() {
        let token = authority.issue(&identity).unwrap();
        let claims = authority.verify(&token).unwrap();
        assert_eq!(claims.account, identity);
        assert_eq!(claims.iss, ISSUER);
    }
}

#[test]
fn test_token_expires_after_24_hours() {
    let authority = authority();
    let identity = identities().remove(0);
    let issued = Utc::now() - Duration::seconds(TOKEN_LIFETIME_SECS) - Duration::seconds(5);

    let token = authority.issue_at(&identity, issued).unwrap();

    // Against the wall clock the token is already stale
    match authority.verify(&token) {
        Err(TokenError::Expired { expired_at }) => {
            assert_eq!(expired_at, issued.timestamp() + TOKEN_LIFETIME_SECS)
        }
        other => panic!("expected Expired, got {:?}", other),
    }

    // ...but it was valid one second before expiry
    let earlier = issued + Duration::seconds(TOKEN_LIFETIME_SECS - 1);
    assert_eq!(authority.verify_at(&token, earlier).unwrap().account, identity);
}

#[test]
fn test_token_from_other_key_pair_rejected() {
    let forger = TokenAuthority::from_pem(OTHER_SIGNING_PEM, OTHER_VERIFY_PEM).unwrap();
    let token = forger.issue(&identities().remove(0)).unwrap();

    assert!(matches!(
        authority().verify(&token),
        Err(TokenError::SignatureInvalid(_))
    ));
}

#[test]
fn test_hmac_token_signed_with_public_key_rejected() {
    // Classic algorithm substitution: HS256 keyed with the public key bytes
    let claims = Claims::new(identities().remove(0), Utc::now().timestamp());
    let forged = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(VERIFY_PEM),
    )
    .unwrap();

    assert!(matches!(
        authority().verify(&forged),
        Err(TokenError::SignatureInvalid(_))
    ));
}

/// Hand-assemble a token with an arbitrary header and no signature check
fn token_with_header(header: &str, signature: &str) -> String {
    let claims = Claims::new(identities().remove(0), Utc::now().timestamp());
    let payload = serde_json::to_vec(&claims).unwrap();
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload),
        signature
    )
}

#[test]
fn test_unsigned_alg_none_token_rejected_as_invalid_signature() {
    let authority = authority();

    for header in [r#"{"alg":"none","typ":"JWT"}"#, r#"{"alg":"None"}"#] {
        let forged = token_with_header(header, "");
        assert!(
            matches!(authority.verify(&forged), Err(TokenError::SignatureInvalid(_))),
            "header {} should be refused",
            header
        );
    }
}

#[test]
fn test_unknown_algorithm_rejected_as_invalid_signature() {
    let forged = token_with_header(r#"{"alg":"XY999","typ":"JWT"}"#, "c2lnbmF0dXJl");

    assert!(matches!(
        authority().verify(&forged),
        Err(TokenError::SignatureInvalid(_))
    ));
}

#[test]
fn test_tampered_signature_rejected() {
    let token = authority().issue(&identities().remove(0)).unwrap();

    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut sig: Vec<char> = signature.chars().collect();
    sig[10] = if sig[10] == 'A' { 'B' } else { 'A' };
    let tampered = format!("{}.{}", head, sig.into_iter().collect::<String>());

    assert!(matches!(
        authority().verify(&tampered),
        Err(TokenError::SignatureInvalid(_))
    ));
}

#[test]
fn test_foreign_issuer_rejected() {
    let mut claims = Claims::new(identities().remove(0), Utc::now().timestamp());
    claims.iss = "someone-else".to_string();
    let token = encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(SIGNING_PEM).unwrap(),
    )
    .unwrap();

    assert!(matches!(
        authority().verify(&token),
        Err(TokenError::SignatureInvalid(_))
    ));
}

#[test]
fn test_structurally_broken_tokens_are_malformed() {
    let authority = authority();

    for token in ["", "abc", "a.b", "a.b.c"] {
        assert!(
            matches!(authority.verify(token), Err(TokenError::MalformedToken(_))),
            "token {:?} should be malformed",
            token
        );
    }
}

#[test]
fn test_verifier_only_authority() {
    let verifier = TokenAuthority::verifier_from_pem(VERIFY_PEM).unwrap();
    let identity = identities().remove(0);

    assert_eq!(verifier.issue(&identity), Err(TokenError::KeyUnavailable));

    let token = authority().issue(&identity).unwrap();
    assert_eq!(verifier.verify(&token).unwrap().account, identity);
}

#[test]
fn test_from_files() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keys");

    let full = TokenAuthority::from_files(Some(&dir.join("signing.pem")), &dir.join("verify.pem"))
        .unwrap();
    assert!(full.can_issue());

    let verifier = TokenAuthority::from_files(None, &dir.join("verify.pem")).unwrap();
    assert!(!verifier.can_issue());

    assert!(TokenAuthority::from_files(None, &dir.join("missing.pem")).is_err());
}
