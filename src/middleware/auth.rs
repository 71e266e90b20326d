// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AppError;
use crate::models::{User, UserRole};
use crate::services::token;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie carrying the access token for browser clients.
pub const SESSION_COOKIE: &str = "learntrack_token";

/// Authenticated identity extracted from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
}

/// Middleware that requires a valid access token.
///
/// The credential may arrive as a cookie or a bearer header; it gets one
/// verification attempt, and any defect is a plain 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let user_id = token::verify_access(&token, &state.config.jwt_signing_key)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Load the calling user and check a role capability.
///
/// Roles form an ordered ladder (admin covers instructor covers student),
/// so the check is a comparison, not an equality test. Deactivated
/// accounts fail regardless of role.
pub async fn require_role(
    state: &AppState,
    auth: &AuthUser,
    required: UserRole,
) -> Result<User, AppError> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }
    if !user.role.can_act_as(required) {
        tracing::warn!(
            user_id = user.id,
            role = ?user.role,
            required = ?required,
            "Capability check failed"
        );
        return Err(AppError::Forbidden);
    }

    Ok(user)
}
