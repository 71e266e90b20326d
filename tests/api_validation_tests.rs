// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Invalid payloads must be rejected with 400 before any business logic
//! or storage access runs; against the offline mock DB, reaching the
//! store would surface as a 500 instead.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn post_json(app: axum::Router, uri: &str, token: Option<&str>, body: &str) -> StatusCode {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let (app, _) = common::create_test_app();

    let status = post_json(
        app,
        "/auth/register",
        None,
        r#"{"email": "not-an-email", "password": "long-enough-pw", "full_name": "A Learner"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (app, _) = common::create_test_app();

    let status = post_json(
        app,
        "/auth/register",
        None,
        r#"{"email": "learner@example.com", "password": "short", "full_name": "A Learner"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_out_of_range_goal() {
    let (app, _) = common::create_test_app();

    let status = post_json(
        app,
        "/auth/register",
        None,
        r#"{"email": "learner@example.com", "password": "long-enough-pw",
            "full_name": "A Learner", "daily_goal_minutes": 9000}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quiz_submission_requires_answers() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_access_token(12345, &state.config.jwt_signing_key);

    let status = post_json(
        app,
        "/api/quizzes/9/attempts",
        Some(&token),
        r#"{"answers": []}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lesson_completion_rejects_bad_scroll_percentage() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_access_token(12345, &state.config.jwt_signing_key);

    let status = post_json(
        app,
        "/api/lessons/100/complete",
        Some(&token),
        r#"{"time_spent_minutes": 3, "scroll_percentage": 150.0}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_change_rejects_short_new_password() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_access_token(12345, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/me/password")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::from(
                    r#"{"current_password": "whatever", "new_password": "short"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
