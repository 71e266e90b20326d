// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuing and verification.
//!
//! Access and refresh tokens are signed HS256 claims, not stored state.
//! Refresh tokens carry a `type` discriminator so the two kinds can never
//! stand in for each other. Verification fails closed: every defect in a
//! presented token (bad signature, expiry, missing subject, wrong kind)
//! yields `None`, never an error the caller could mishandle.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Claim value marking a refresh token.
const KIND_REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Token kind; only present on refresh tokens
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

/// Issue a short-lived access token for a user session.
pub fn issue_access(user_id: u64, ttl_minutes: u64, signing_key: &[u8]) -> anyhow::Result<String> {
    let now = unix_now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + (ttl_minutes * 60) as usize,
        kind: None,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Issue a long-lived refresh token, marked with the refresh kind.
pub fn issue_refresh(user_id: u64, ttl_days: u64, signing_key: &[u8]) -> anyhow::Result<String> {
    let now = unix_now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + (ttl_days * 24 * 60 * 60) as usize,
        kind: Some(KIND_REFRESH.to_string()),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify an access token, returning the subject user ID.
///
/// A refresh token presented here is rejected even though its signature
/// verifies.
pub fn verify_access(token: &str, signing_key: &[u8]) -> Option<u64> {
    let claims = decode_claims(token, signing_key)?;
    if claims.kind.is_some() {
        return None;
    }
    claims.sub.parse().ok()
}

/// Verify a refresh token, returning the subject user ID.
///
/// Only tokens carrying the refresh discriminator are accepted.
pub fn verify_refresh(token: &str, signing_key: &[u8]) -> Option<u64> {
    let claims = decode_claims(token, signing_key)?;
    if claims.kind.as_deref() != Some(KIND_REFRESH) {
        return None;
    }
    claims.sub.parse().ok()
}

fn decode_claims(token: &str, signing_key: &[u8]) -> Option<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked below instead: strict, with no leeway, so a token
    // issued with ttl=0 is already dead.
    validation.validate_exp = false;

    let claims = decode::<Claims>(token, &key, &validation).ok()?.claims;
    if claims.exp <= unix_now() {
        return None;
    }
    Some(claims)
}
