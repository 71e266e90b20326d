// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification (Argon2id).
//!
//! Hashing is deliberately expensive; it is the throttle on credential
//! brute-forcing and must stay on the request path.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};

use crate::error::AppError;

/// Hash a password with a fresh random salt.
///
/// The output is a self-describing PHC string (algorithm, parameters,
/// salt, digest), so verification needs no extra stored state.
pub fn hash(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC string.
///
/// Always answers; a malformed digest counts as a non-match rather than
/// an error. The digest comparison inside argon2 is constant-time.
pub fn verify(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Burn the same CPU cost as a real verification.
///
/// Called when a login names an unknown email, so the response time does
/// not reveal whether the account exists.
pub fn equalize_timing(password: &str) {
    let salt = SaltString::generate(&mut OsRng);
    let _ = Argon2::default().hash_password(password.as_bytes(), &salt);
}
