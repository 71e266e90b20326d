// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile and account management.

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_role, AuthUser};
use crate::models::UserRole;
use crate::routes::auth::{MessageResponse, UserResponse};
use crate::services::user::{ProfileUpdate, UserService};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via the session middleware).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/me/password", put(change_password))
        .route("/api/users/{user_id}/deactivate", post(deactivate_user))
        .route("/api/users/{user_id}/activate", post(activate_user))
        .route("/api/users/{user_id}/verify", post(verify_user))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let service = UserService::new(state.db.clone());
    let user = service
        .get_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;

    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub avatar_url: Option<String>,
    #[validate(range(min = 1, max = 30, message = "must be between 1 and 30 minutes"))]
    pub preferred_lesson_duration_minutes: Option<u32>,
    #[validate(range(min = 5, max = 300, message = "must be between 5 and 300 minutes"))]
    pub daily_goal_minutes: Option<u32>,
}

/// Update the caller's profile. Role is deliberately absent here; there
/// is no role-change surface.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let service = UserService::new(state.db.clone());
    let user = service
        .update_profile(
            auth.user_id,
            ProfileUpdate {
                full_name: payload.full_name,
                bio: payload.bio,
                avatar_url: payload.avatar_url,
                preferred_lesson_duration_minutes: payload.preferred_lesson_duration_minutes,
                daily_goal_minutes: payload.daily_goal_minutes,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub new_password: String,
}

/// Change the caller's password (current password required).
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let service = UserService::new(state.db.clone());
    service
        .change_password(auth.user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

// ─── Account Administration ──────────────────────────────────

/// Soft-disable an account. Admin capability required.
async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserResponse>> {
    require_role(&state, &auth, UserRole::Admin).await?;

    let service = UserService::new(state.db.clone());
    let user = service.deactivate(user_id).await?;

    Ok(Json(user.into()))
}

/// Re-enable a soft-disabled account. Admin capability required.
async fn activate_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserResponse>> {
    require_role(&state, &auth, UserRole::Admin).await?;

    let service = UserService::new(state.db.clone());
    let user = service.activate(user_id).await?;

    Ok(Json(user.into()))
}

/// Mark an account's email as verified. Admin capability required; the
/// verification mail flow itself lives outside this service.
async fn verify_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserResponse>> {
    require_role(&state, &auth, UserRole::Admin).await?;

    let service = UserService::new(state.db.clone());
    let user = service.mark_verified(user_id).await?;

    Ok(Json(user.into()))
}
