// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress tracking integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set); without it they are skipped.

use learntrack::models::{Course, Lesson, Quiz, QuizAnswer, QuizQuestion};
use learntrack::services::progress::{LessonTelemetry, ProgressService, SubmittedAnswer};

mod common;
use common::test_db;

/// Generate a unique ID for test isolation.
///
/// Kept well below u64::MAX so derived IDs (course_id * 100) cannot
/// overflow.
fn unique_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
        % 1_000_000_000_000
}

fn test_course(course_id: u64, total_lessons: u32) -> Course {
    Course {
        id: course_id,
        title: "Intro to Ownership".to_string(),
        description: "Short lessons on ownership and borrowing".to_string(),
        topic: "rust".to_string(),
        difficulty_level: "beginner".to_string(),
        slug: format!("intro-to-ownership-{}", course_id),
        total_lessons,
        estimated_duration_minutes: total_lessons * 3,
        is_published: true,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn test_lesson(lesson_id: u64, course_id: u64, order_index: u32) -> Lesson {
    Lesson {
        id: lesson_id,
        course_id,
        title: format!("Lesson {}", order_index + 1),
        content: "Lesson body".to_string(),
        order_index,
        duration_minutes: 3,
        key_concepts: vec!["ownership".to_string()],
        is_published: true,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn test_quiz(quiz_id: u64, lesson_id: u64) -> Quiz {
    Quiz {
        id: quiz_id,
        lesson_id,
        title: "Checkpoint".to_string(),
        passing_score: 0.7,
        max_attempts: 3,
        questions: vec![QuizQuestion {
            id: 1,
            text: "Who owns a moved value?".to_string(),
            points: 1,
            concept_tags: vec!["ownership".to_string()],
            answers: vec![
                QuizAnswer {
                    id: 11,
                    text: "The new binding".to_string(),
                    is_correct: true,
                },
                QuizAnswer {
                    id: 12,
                    text: "Both bindings".to_string(),
                    is_correct: false,
                },
            ],
        }],
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// Seed a three-lesson course with a quiz on the first lesson.
async fn seed_course(db: &learntrack::db::FirestoreDb, course_id: u64) {
    db.upsert_course(&test_course(course_id, 3)).await.unwrap();
    for i in 0..3 {
        db.upsert_lesson(&test_lesson(course_id * 10 + i, course_id, i as u32))
            .await
            .unwrap();
    }
    db.upsert_quiz(&test_quiz(course_id * 100, course_id * 10))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_enroll_is_idempotent() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id();
    let course_id = unique_id();
    seed_course(&db, course_id).await;

    let service = ProgressService::new(db.clone());

    let first = service.enroll(user_id, course_id).await.unwrap();
    assert_eq!(first.current_lesson_id, Some(course_id * 10));
    assert_eq!(first.next_lesson_id, Some(course_id * 10 + 1));

    // Re-enrolling leaves the row untouched
    let second = service.enroll(user_id, course_id).await.unwrap();
    assert_eq!(second.enrolled_at, first.enrolled_at);
    assert_eq!(second.lessons_completed, 0);

    let all = service.progress_for_user(user_id).await.unwrap();
    assert_eq!(all.len(), 1, "Exactly one progress row per user x course");
}

#[tokio::test]
async fn test_completing_every_lesson_reaches_100_percent() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id();
    let course_id = unique_id();
    seed_course(&db, course_id).await;

    let service = ProgressService::new(db.clone());
    service.enroll(user_id, course_id).await.unwrap();

    for i in 0..3 {
        let telemetry = LessonTelemetry {
            time_spent_minutes: 3,
            ..Default::default()
        };
        service
            .complete_lesson(user_id, course_id * 10 + i, telemetry)
            .await
            .unwrap();
    }

    let progress = service.course_progress(user_id, course_id).await.unwrap();
    assert_eq!(progress.lessons_completed, 3);
    assert_eq!(progress.completion_percentage, 100.0);
    assert!(progress.is_completed);
    assert_eq!(progress.total_time_spent_minutes, 9);

    // Completing an already-completed lesson doesn't overshoot
    service
        .complete_lesson(user_id, course_id * 10, LessonTelemetry::default())
        .await
        .unwrap();
    let progress = service.course_progress(user_id, course_id).await.unwrap();
    assert_eq!(progress.lessons_completed, 3);
    assert_eq!(progress.completion_percentage, 100.0);
}

#[tokio::test]
async fn test_quiz_attempt_numbers_increase_from_one() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id();
    let course_id = unique_id();
    seed_course(&db, course_id).await;

    let service = ProgressService::new(db.clone());
    service.enroll(user_id, course_id).await.unwrap();

    let quiz_id = course_id * 100;
    let right = vec![SubmittedAnswer {
        question_id: 1,
        answer_id: Some(11),
    }];
    let wrong = vec![SubmittedAnswer {
        question_id: 1,
        answer_id: Some(12),
    }];

    let first = service
        .record_quiz_attempt(user_id, quiz_id, &wrong, None)
        .await
        .unwrap();
    assert_eq!(first.attempt_number, 1);
    assert!(!first.is_passed);
    assert_eq!(first.concepts_to_review, vec!["ownership".to_string()]);

    let second = service
        .record_quiz_attempt(user_id, quiz_id, &right, None)
        .await
        .unwrap();
    assert_eq!(second.attempt_number, 2);
    assert!(second.is_passed);
    assert_eq!(second.concepts_mastered, vec!["ownership".to_string()]);

    // The failed concept was pruned after the clean attempt
    let progress = service.course_progress(user_id, course_id).await.unwrap();
    assert!(progress.concepts_to_review.is_empty());

    let third = service
        .record_quiz_attempt(user_id, quiz_id, &right, None)
        .await
        .unwrap();
    assert_eq!(third.attempt_number, 3);

    // max_attempts is 3: the fourth submission is rejected
    let err = service
        .record_quiz_attempt(user_id, quiz_id, &right, None)
        .await
        .unwrap_err();
    assert!(matches!(err, learntrack::error::AppError::BadRequest(_)));
}
