// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token issuer/verifier compatibility tests.
//!
//! These tests verify that tokens minted by the login flow can be decoded
//! by the session middleware, catching claim-format drift early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use learntrack::services::token;
use serde::Deserialize;

const KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// Raw claims as they appear on the wire. If the `Claims` struct in the
/// crate changes shape, these tests should catch the incompatibility.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    exp: usize,
    iat: usize,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

fn decode_raw(token: &str) -> RawClaims {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    decode::<RawClaims>(token, &DecodingKey::from_secret(KEY), &validation)
        .expect("token should decode")
        .claims
}

#[test]
fn test_access_token_round_trip() {
    let token = token::issue_access(12345678, 30, KEY).unwrap();

    assert_eq!(token::verify_access(&token, KEY), Some(12345678));

    let claims = decode_raw(&token);
    assert_eq!(claims.sub, "12345678");
    assert_eq!(claims.kind, None);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_refresh_token_carries_kind_discriminator() {
    let token = token::issue_refresh(98765432, 7, KEY).unwrap();

    assert_eq!(token::verify_refresh(&token, KEY), Some(98765432));

    let claims = decode_raw(&token);
    assert_eq!(claims.kind.as_deref(), Some("refresh"));
}

#[test]
fn test_kind_confusion_fails_both_ways() {
    let access = token::issue_access(1, 30, KEY).unwrap();
    let refresh = token::issue_refresh(1, 7, KEY).unwrap();

    assert_eq!(token::verify_access(&refresh, KEY), None);
    assert_eq!(token::verify_refresh(&access, KEY), None);
}

#[test]
fn test_refresh_expiration_is_seven_days_out() {
    use std::time::{SystemTime, UNIX_EPOCH};

    let token = token::issue_refresh(12345, 7, KEY).unwrap();
    let claims = decode_raw(&token);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    // Expires at least 6.9 days in the future
    assert!(
        claims.exp > now + 86400 * 69 / 10,
        "Refresh token expiration should be ~7 days in the future"
    );
}

#[test]
fn test_verification_fails_closed_on_wrong_key() {
    let token = token::issue_access(1, 30, KEY).unwrap();
    assert_eq!(
        token::verify_access(&token, b"some_other_key_32_bytes_long!!!!"),
        None
    );
}
