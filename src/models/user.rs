//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User role with ordered capabilities: each role can do everything the
/// roles below it can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    fn rank(self) -> u8 {
        match self {
            UserRole::Student => 0,
            UserRole::Instructor => 1,
            UserRole::Admin => 2,
        }
    }

    /// Whether this role satisfies a capability requirement.
    /// Admin covers instructor, instructor covers student.
    pub fn can_act_as(self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }
}

/// User profile stored in Firestore.
///
/// `password_hash` is an Argon2 PHC string and must never reach an API
/// response; handlers convert to a public representation first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Numeric user ID (also used as document ID)
    pub id: u64,
    /// Email address (unique, the login identifier)
    pub email: String,
    pub password_hash: String,
    /// Soft-disable flag; accounts are never hard-deleted
    pub is_active: bool,
    pub is_verified: bool,
    pub full_name: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Preferred lesson length in minutes (1-30)
    pub preferred_lesson_duration_minutes: u32,
    /// Daily learning goal in minutes (5-300)
    pub daily_goal_minutes: u32,
    /// When the account was created (ISO 8601)
    pub created_at: String,
    /// Last profile mutation (ISO 8601)
    pub updated_at: String,
    /// Last successful login (ISO 8601)
    pub last_login: Option<String>,
}
