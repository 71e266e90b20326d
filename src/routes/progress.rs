// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress routes: enrollment, lesson completion, quiz attempts.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{LessonProgress, QuizAttempt, UserProgress};
use crate::services::progress::{LessonTelemetry, ProgressService, SubmittedAnswer};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Progress routes (require authentication via the session middleware).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/progress", get(list_progress))
        .route("/api/courses/{course_id}/enroll", post(enroll))
        .route("/api/courses/{course_id}/favorite", post(toggle_favorite))
        .route("/api/courses/{course_id}/progress", get(course_progress))
        .route("/api/lessons/{lesson_id}/complete", post(complete_lesson))
        .route(
            "/api/quizzes/{quiz_id}/attempts",
            post(submit_quiz).get(list_attempts),
        )
}

// ─── Responses ───────────────────────────────────────────────

/// Course-level progress for the caller.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub course_id: u64,
    pub completion_percentage: f64,
    pub lessons_completed: u32,
    pub total_time_spent_minutes: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub current_lesson_id: Option<u64>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub next_lesson_id: Option<u64>,
    pub streak_days: u32,
    pub is_completed: bool,
    pub is_favorited: bool,
    pub concepts_to_review: Vec<String>,
    pub next_review_date: Option<String>,
    pub review_interval_days: u32,
    pub enrolled_at: String,
    pub completed_at: Option<String>,
}

impl From<UserProgress> for ProgressResponse {
    fn from(p: UserProgress) -> Self {
        Self {
            course_id: p.course_id,
            completion_percentage: p.completion_percentage,
            lessons_completed: p.lessons_completed,
            total_time_spent_minutes: p.total_time_spent_minutes,
            current_lesson_id: p.current_lesson_id,
            next_lesson_id: p.next_lesson_id,
            streak_days: p.streak_days,
            is_completed: p.is_completed,
            is_favorited: p.is_favorited,
            concepts_to_review: p.concepts_to_review,
            next_review_date: p.next_review_date,
            review_interval_days: p.review_interval_days,
            enrolled_at: p.enrolled_at,
            completed_at: p.completed_at,
        }
    }
}

/// One row of the caller's progress dashboard.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub course_id: u64,
    /// Course title, when the course still exists
    pub course_title: Option<String>,
    pub completion_percentage: f64,
    pub lessons_completed: u32,
    pub streak_days: u32,
    pub is_completed: bool,
    pub is_favorited: bool,
    pub next_review_date: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressListResponse {
    pub courses: Vec<ProgressSummary>,
}

/// Lesson-level progress after a completion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LessonProgressResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub lesson_id: u64,
    pub is_completed: bool,
    pub time_spent_minutes: u32,
    pub mastery_level: f64,
    pub review_count: u32,
    pub next_review_date: Option<String>,
}

impl From<LessonProgress> for LessonProgressResponse {
    fn from(p: LessonProgress) -> Self {
        Self {
            lesson_id: p.lesson_id,
            is_completed: p.is_completed,
            time_spent_minutes: p.time_spent_minutes,
            mastery_level: p.mastery_level,
            review_count: p.review_count,
            next_review_date: p.next_review_date,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompleteLessonResponse {
    pub lesson: LessonProgressResponse,
    pub course: ProgressResponse,
}

/// A graded quiz attempt.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AttemptResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub quiz_id: u64,
    pub attempt_number: u32,
    pub score: f64,
    pub points_earned: u32,
    pub total_points: u32,
    pub is_passed: bool,
    pub questions_correct: u32,
    pub questions_incorrect: u32,
    pub questions_skipped: u32,
    pub concepts_mastered: Vec<String>,
    pub concepts_to_review: Vec<String>,
    pub completed_at: String,
}

impl From<QuizAttempt> for AttemptResponse {
    fn from(a: QuizAttempt) -> Self {
        Self {
            quiz_id: a.quiz_id,
            attempt_number: a.attempt_number,
            score: a.score,
            points_earned: a.points_earned,
            total_points: a.total_points,
            is_passed: a.is_passed,
            questions_correct: a.questions_correct,
            questions_incorrect: a.questions_incorrect,
            questions_skipped: a.questions_skipped,
            concepts_mastered: a.concepts_mastered,
            concepts_to_review: a.concepts_to_review,
            completed_at: a.completed_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AttemptListResponse {
    pub attempts: Vec<AttemptResponse>,
}

// ─── Handlers ────────────────────────────────────────────────

/// Enroll in a course. Safe to repeat; the existing row is returned.
async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<u64>,
) -> Result<Json<ProgressResponse>> {
    let service = ProgressService::new(state.db.clone());
    let progress = service.enroll(auth.user_id, course_id).await?;
    Ok(Json(progress.into()))
}

/// Toggle the favorite flag on an enrolled course.
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<u64>,
) -> Result<Json<ProgressResponse>> {
    let service = ProgressService::new(state.db.clone());
    let progress = service.toggle_favorite(auth.user_id, course_id).await?;
    Ok(Json(progress.into()))
}

/// The caller's progress across all enrolled courses.
async fn list_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProgressListResponse>> {
    let service = ProgressService::new(state.db.clone());
    let rows = service.progress_for_user(auth.user_id).await?;

    // One bounded-concurrency sweep for the course titles
    let course_ids: Vec<u64> = rows.iter().map(|p| p.course_id).collect();
    let courses = state.db.get_courses_by_ids(&course_ids).await?;

    let summaries = rows
        .into_iter()
        .map(|p| {
            let course_title = courses
                .iter()
                .find(|c| c.id == p.course_id)
                .map(|c| c.title.clone());
            ProgressSummary {
                course_id: p.course_id,
                course_title,
                completion_percentage: p.completion_percentage,
                lessons_completed: p.lessons_completed,
                streak_days: p.streak_days,
                is_completed: p.is_completed,
                is_favorited: p.is_favorited,
                next_review_date: p.next_review_date,
            }
        })
        .collect();

    Ok(Json(ProgressListResponse { courses: summaries }))
}

/// The caller's progress in one course.
async fn course_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<u64>,
) -> Result<Json<ProgressResponse>> {
    let service = ProgressService::new(state.db.clone());
    let progress = service.course_progress(auth.user_id, course_id).await?;
    Ok(Json(progress.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteLessonRequest {
    /// Minutes spent on the lesson in this sitting
    #[validate(range(max = 1440, message = "must be at most a day"))]
    #[serde(default)]
    pub time_spent_minutes: u32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub scroll_percentage: Option<f64>,
    pub interaction_count: Option<u32>,
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
}

/// Record completion of a lesson.
async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(lesson_id): Path<u64>,
    Json(payload): Json<CompleteLessonRequest>,
) -> Result<Json<CompleteLessonResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let service = ProgressService::new(state.db.clone());
    let (lesson_progress, course_progress) = service
        .complete_lesson(
            auth.user_id,
            lesson_id,
            LessonTelemetry {
                time_spent_minutes: payload.time_spent_minutes,
                scroll_percentage: payload.scroll_percentage,
                interactions: payload.interaction_count,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(Json(CompleteLessonResponse {
        lesson: lesson_progress.into(),
        course: course_progress.into(),
    }))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SubmittedAnswerBody {
    pub question_id: u64,
    /// Absent or null means the question was skipped
    #[serde(default)]
    pub answer_id: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, message = "at least one answer is required"))]
    pub answers: Vec<SubmittedAnswerBody>,
    pub started_at: Option<String>,
}

/// Grade and record a quiz attempt.
async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(quiz_id): Path<u64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<Json<AttemptResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let answers: Vec<SubmittedAnswer> = payload
        .answers
        .iter()
        .map(|a| SubmittedAnswer {
            question_id: a.question_id,
            answer_id: a.answer_id,
        })
        .collect();

    let service = ProgressService::new(state.db.clone());
    let attempt = service
        .record_quiz_attempt(auth.user_id, quiz_id, &answers, payload.started_at)
        .await?;

    Ok(Json(attempt.into()))
}

/// The caller's past attempts on one quiz, newest first.
async fn list_attempts(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(quiz_id): Path<u64>,
) -> Result<Json<AttemptListResponse>> {
    let attempts = state.db.get_attempts(auth.user_id, quiz_id).await?;
    Ok(Json(AttemptListResponse {
        attempts: attempts.into_iter().map(Into::into).collect(),
    }))
}
