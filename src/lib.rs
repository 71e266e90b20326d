// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Learntrack: backend API for an AI-assisted micro-learning platform.
//!
//! This crate provides user registration and token-based sessions plus
//! per-user course, lesson, and quiz progress tracking with a
//! spaced-repetition review schedule.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
