// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use learntrack::config::Config;
use learntrack::db::FirestoreDb;
use learntrack::routes::create_router;
use learntrack::services::token;
use learntrack::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let state = Arc::new(AppState { config, db });

    (create_router(state.clone()), state)
}

/// Mint a valid access token for a test user.
#[allow(dead_code)]
pub fn create_test_access_token(user_id: u64, signing_key: &[u8]) -> String {
    token::issue_access(user_id, 30, signing_key).expect("Failed to create access token")
}

/// Mint a valid refresh token for a test user.
#[allow(dead_code)]
pub fn create_test_refresh_token(user_id: u64, signing_key: &[u8]) -> String {
    token::issue_refresh(user_id, 7, signing_key).expect("Failed to create refresh token")
}
