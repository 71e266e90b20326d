// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod password;
pub mod progress;
pub mod token;
pub mod user;

pub use progress::ProgressService;
pub use user::UserService;
