// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: registration, login, token refresh, logout.

use axum::{
    extract::State,
    routing::post,
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{User, UserRole};
use crate::services::token;
use crate::services::user::{NewUser, UserService};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login_form))
        .route("/auth/login/json", post(login_json))
        .route("/auth/refresh", post(refresh))
}

/// Routes that sit behind the auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

// ─── Payloads ────────────────────────────────────────────────

fn default_lesson_duration() -> u32 {
    3
}
fn default_daily_goal() -> u32 {
    15
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    pub bio: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub avatar_url: Option<String>,
    /// Preferred lesson length in minutes
    #[serde(default = "default_lesson_duration")]
    #[validate(range(min = 1, max = 30, message = "must be between 1 and 30 minutes"))]
    pub preferred_lesson_duration_minutes: u32,
    /// Daily learning goal in minutes
    #[serde(default = "default_daily_goal")]
    #[validate(range(min = 5, max = 300, message = "must be between 5 and 300 minutes"))]
    pub daily_goal_minutes: u32,
}

/// OAuth2-style form login (`username` carries the email).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ─── Responses ───────────────────────────────────────────────

/// Public user representation; never carries the password hash.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub preferred_lesson_duration_minutes: u32,
    pub daily_goal_minutes: u32,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            bio: user.bio,
            avatar_url: user.avatar_url,
            preferred_lesson_duration_minutes: user.preferred_lesson_duration_minutes,
            daily_goal_minutes: user.daily_goal_minutes,
            is_active: user.is_active,
            is_verified: user.is_verified,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

// ─── Handlers ────────────────────────────────────────────────

/// Register a new user account.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let service = UserService::new(state.db.clone());
    let user = service
        .create(NewUser {
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            bio: payload.bio,
            avatar_url: payload.avatar_url,
            preferred_lesson_duration_minutes: payload.preferred_lesson_duration_minutes,
            daily_goal_minutes: payload.daily_goal_minutes,
        })
        .await?;

    Ok(Json(user.into()))
}

/// Form login (OAuth2 password flow shape).
async fn login_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    issue_session(&state, &form.username, &form.password).await
}

/// JSON login.
async fn login_json(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    issue_session(&state, &payload.email, &payload.password).await
}

/// Shared login path: check credentials, reject inactive accounts, mint
/// both tokens, stamp last_login (best effort).
async fn issue_session(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<Json<TokenResponse>> {
    let service = UserService::new(state.db.clone());

    let user = match service.authenticate(email, password).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Login attempt failed");
            return Err(AppError::Unauthorized);
        }
    };

    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user account".to_string()));
    }

    let response = mint_token_pair(&state.config, user.id)?;

    service.update_last_login(user.id).await;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(response))
}

/// Exchange a valid refresh token for a fresh access+refresh pair.
///
/// The old refresh token is not revoked; it simply ages out (stateless
/// expiry).
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    let user_id = token::verify_refresh(&payload.refresh_token, &state.config.jwt_signing_key)
        .ok_or(AppError::InvalidToken)?;

    // The subject must still exist and be active
    let service = UserService::new(state.db.clone());
    let user = match service.get_by_id(user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Err(AppError::InvalidToken),
    };

    let response = mint_token_pair(&state.config, user.id)?;
    tracing::info!(user_id = user.id, "Tokens refreshed");

    Ok(Json(response))
}

/// Stateless logout acknowledgment; the client discards its tokens.
async fn logout(Extension(auth): Extension<AuthUser>) -> Json<MessageResponse> {
    tracing::info!(user_id = auth.user_id, "User logged out");
    Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    })
}

fn mint_token_pair(config: &crate::config::Config, user_id: u64) -> Result<TokenResponse> {
    let access_token = token::issue_access(
        user_id,
        config.access_token_ttl_minutes,
        &config.jwt_signing_key,
    )
    .map_err(AppError::Internal)?;

    let refresh_token = token::issue_refresh(
        user_id,
        config.refresh_token_ttl_days,
        &config.jwt_signing_key,
    )
    .map_err(AppError::Internal)?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: config.access_token_ttl_minutes * 60,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> RegisterRequest {
        RegisterRequest {
            email: "learner@example.com".to_string(),
            password: "a-long-password".to_string(),
            full_name: "Learner".to_string(),
            bio: None,
            avatar_url: None,
            preferred_lesson_duration_minutes: 3,
            daily_goal_minutes: 15,
        }
    }

    #[test]
    fn test_register_payload_accepts_valid_input() {
        assert!(valid_payload().validate().is_ok());
    }

    #[test]
    fn test_register_payload_rejects_bad_email() {
        let mut payload = valid_payload();
        payload.email = "not-an-email".to_string();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_register_payload_rejects_short_password() {
        let mut payload = valid_payload();
        payload.password = "short".to_string();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_register_payload_rejects_out_of_range_preferences() {
        let mut payload = valid_payload();
        payload.preferred_lesson_duration_minutes = 31;
        assert!(payload.validate().is_err());

        let mut payload = valid_payload();
        payload.daily_goal_minutes = 4;
        assert!(payload.validate().is_err());
    }
}
