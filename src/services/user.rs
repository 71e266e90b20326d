// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory: lookups, account lifecycle, and credential checks.

use rand::Rng;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{User, UserRole};
use crate::services::password;
use crate::time_utils::now_rfc3339;

/// Inputs for creating a user. Role is not an input: registration always
/// produces a student, and no public operation changes roles afterwards.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub preferred_lesson_duration_minutes: u32,
    pub daily_goal_minutes: u32,
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub preferred_lesson_duration_minutes: Option<u32>,
    pub daily_goal_minutes: Option<u32>,
}

/// Service for user-related operations.
#[derive(Clone)]
pub struct UserService {
    db: FirestoreDb,
}

impl UserService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.db.get_user(user_id).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.db.get_user_by_email(email).await
    }

    /// Create a new user account.
    ///
    /// Rejects duplicate emails. The store has no unique index on email,
    /// so this is lookup-then-create; the residual race between two
    /// simultaneous registrations of one address is accepted.
    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        if self.get_by_email(&new_user.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let password_hash = password::hash(&new_user.password)?;
        let id = self.mint_user_id().await?;
        let now = now_rfc3339();

        let user = User {
            id,
            email: new_user.email,
            password_hash,
            is_active: true,
            is_verified: false,
            full_name: new_user.full_name,
            role: UserRole::Student,
            bio: new_user.bio,
            avatar_url: new_user.avatar_url,
            preferred_lesson_duration_minutes: new_user.preferred_lesson_duration_minutes,
            daily_goal_minutes: new_user.daily_goal_minutes,
            created_at: now.clone(),
            updated_at: now,
            last_login: None,
        };

        self.db.upsert_user(&user).await?;
        tracing::info!(user_id = user.id, "User created");

        Ok(user)
    }

    /// Apply a partial profile update.
    pub async fn update_profile(
        &self,
        user_id: u64,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let mut user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        if let Some(duration) = update.preferred_lesson_duration_minutes {
            user.preferred_lesson_duration_minutes = duration;
        }
        if let Some(goal) = update.daily_goal_minutes {
            user.daily_goal_minutes = goal;
        }
        user.updated_at = now_rfc3339();

        self.db.upsert_user(&user).await?;
        Ok(user)
    }

    /// Replace the password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: u64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if !password::verify(current_password, &user.password_hash) {
            return Err(AppError::Unauthorized);
        }

        user.password_hash = password::hash(new_password)?;
        user.updated_at = now_rfc3339();
        self.db.upsert_user(&user).await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Check an email/password pair, returning the user on a match.
    ///
    /// When the email is unknown we still burn a full hashing round, so
    /// account existence is not observable through response timing.
    /// Active/inactive is the caller's concern, not this method's.
    pub async fn authenticate(
        &self,
        email: &str,
        plain_password: &str,
    ) -> Result<Option<User>, AppError> {
        let user = match self.get_by_email(email).await? {
            Some(user) => user,
            None => {
                password::equalize_timing(plain_password);
                return Ok(None);
            }
        };

        if password::verify(plain_password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Stamp a successful login. Best-effort: a failure here is logged
    /// and swallowed so it can never fail the login itself.
    pub async fn update_last_login(&self, user_id: u64) {
        let result = async {
            let mut user = self
                .db
                .get_user(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            user.last_login = Some(now_rfc3339());
            self.db.upsert_user(&user).await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id, error = %e, "Failed to update last login");
        }
    }

    /// Soft-disable an account. Accounts are never hard-deleted.
    pub async fn deactivate(&self, user_id: u64) -> Result<User, AppError> {
        self.set_active(user_id, false).await
    }

    /// Re-enable a soft-disabled account.
    pub async fn activate(&self, user_id: u64) -> Result<User, AppError> {
        self.set_active(user_id, true).await
    }

    async fn set_active(&self, user_id: u64, active: bool) -> Result<User, AppError> {
        let mut user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        user.is_active = active;
        user.updated_at = now_rfc3339();
        self.db.upsert_user(&user).await?;

        tracing::info!(user_id, active, "Account active flag changed");
        Ok(user)
    }

    /// Flip the verified flag (the verification flow itself lives
    /// outside this service).
    pub async fn mark_verified(&self, user_id: u64) -> Result<User, AppError> {
        let mut user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        user.is_verified = true;
        user.updated_at = now_rfc3339();
        self.db.upsert_user(&user).await?;
        Ok(user)
    }

    /// Mint a random numeric ID, retrying on the (unlikely) collision.
    async fn mint_user_id(&self) -> Result<u64, AppError> {
        for _ in 0..8 {
            // Keep IDs in a range that survives JSON number handling
            let candidate = rand::thread_rng().gen_range(1..=u64::MAX >> 11);
            if self.db.get_user(candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "Could not allocate a user ID"
        )))
    }
}
