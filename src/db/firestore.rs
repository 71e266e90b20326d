// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, looked up by ID or email)
//! - Course content (courses, lessons, quizzes - read side)
//! - Progress (course/lesson progress, quiz attempts)
//!
//! Progress mutations that touch several documents go through
//! transactions so counters and attempt numbers cannot tear under
//! concurrent requests for the same user.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Course, Lesson, LessonProgress, Quiz, QuizAttempt, User, UserProgress};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by their unique email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Course Content (read side) ──────────────────────────────

    /// Get a course by ID.
    pub async fn get_course(&self, course_id: u64) -> Result<Option<Course>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COURSES)
            .obj()
            .one(&course_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch several courses concurrently (bounded), skipping absent IDs.
    pub async fn get_courses_by_ids(&self, course_ids: &[u64]) -> Result<Vec<Course>, AppError> {
        let courses = stream::iter(course_ids.to_vec())
            .map(|id| self.get_course(id))
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Course>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Course>>, AppError>>()?;

        Ok(courses.into_iter().flatten().collect())
    }

    /// Get a lesson by ID.
    pub async fn get_lesson(&self, lesson_id: u64) -> Result<Option<Lesson>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LESSONS)
            .obj()
            .one(&lesson_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a course's lessons in sequence order.
    pub async fn get_lessons_for_course(&self, course_id: u64) -> Result<Vec<Lesson>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LESSONS)
            .filter(move |q| q.field("course_id").eq(course_id))
            .order_by([(
                "order_index",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a quiz (with its embedded questions) by ID.
    pub async fn get_quiz(&self, quiz_id: u64) -> Result<Option<Quiz>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::QUIZZES)
            .obj()
            .one(&quiz_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a course (content seeding and tests).
    pub async fn upsert_course(&self, course: &Course) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COURSES)
            .document_id(course.id.to_string())
            .object(course)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Store a lesson (content seeding and tests).
    pub async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LESSONS)
            .document_id(lesson.id.to_string())
            .object(lesson)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Store a quiz (content seeding and tests).
    pub async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::QUIZZES)
            .document_id(quiz.id.to_string())
            .object(quiz)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Course Progress ─────────────────────────────────────────

    /// Get a user's progress in one course.
    pub async fn get_progress(
        &self,
        user_id: u64,
        course_id: u64,
    ) -> Result<Option<UserProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COURSE_PROGRESS)
            .obj()
            .one(&progress_doc_id(user_id, course_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all course progress rows for a user, newest enrollment first.
    pub async fn get_progress_for_user(
        &self,
        user_id: u64,
    ) -> Result<Vec<UserProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COURSE_PROGRESS)
            .filter(move |q| q.field("user_id").eq(user_id))
            .order_by([(
                "enrolled_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a course progress row.
    pub async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COURSE_PROGRESS)
            .document_id(progress_doc_id(progress.user_id, progress.course_id))
            .object(progress)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Lesson Progress ─────────────────────────────────────────

    /// Get a user's progress on one lesson.
    pub async fn get_lesson_progress(
        &self,
        user_id: u64,
        lesson_id: u64,
    ) -> Result<Option<LessonProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LESSON_PROGRESS)
            .obj()
            .one(&lesson_progress_doc_id(user_id, lesson_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Quiz Attempts ───────────────────────────────────────────

    /// Highest attempt number so far for (user, quiz); 0 when none.
    pub async fn latest_attempt_number(
        &self,
        user_id: u64,
        quiz_id: u64,
    ) -> Result<u32, AppError> {
        let latest: Vec<QuizAttempt> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::QUIZ_ATTEMPTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("quiz_id").eq(quiz_id),
                ])
            })
            .order_by([(
                "attempt_number",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(latest.first().map(|a| a.attempt_number).unwrap_or(0))
    }

    /// All attempts for (user, quiz), newest first.
    pub async fn get_attempts(
        &self,
        user_id: u64,
        quiz_id: u64,
    ) -> Result<Vec<QuizAttempt>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUIZ_ATTEMPTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("quiz_id").eq(quiz_id),
                ])
            })
            .order_by([(
                "attempt_number",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Progress Writes ──────────────────────────────────

    /// Commit a lesson completion: the lesson progress row and the parent
    /// course progress row succeed or fail together.
    pub async fn write_lesson_completion(
        &self,
        lesson_progress: &LessonProgress,
        progress: &UserProgress,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::LESSON_PROGRESS)
            .document_id(lesson_progress_doc_id(
                lesson_progress.user_id,
                lesson_progress.lesson_id,
            ))
            .object(lesson_progress)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add lesson progress to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::COURSE_PROGRESS)
            .document_id(progress_doc_id(progress.user_id, progress.course_id))
            .object(progress)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add course progress to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    /// Commit a quiz attempt: the append-only attempt document plus both
    /// progress rows it updates, atomically.
    pub async fn write_quiz_attempt(
        &self,
        attempt: &QuizAttempt,
        lesson_progress: &LessonProgress,
        progress: &UserProgress,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::QUIZ_ATTEMPTS)
            .document_id(attempt_doc_id(
                attempt.user_id,
                attempt.quiz_id,
                attempt.attempt_number,
            ))
            .object(attempt)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add attempt to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::LESSON_PROGRESS)
            .document_id(lesson_progress_doc_id(
                lesson_progress.user_id,
                lesson_progress.lesson_id,
            ))
            .object(lesson_progress)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add lesson progress to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::COURSE_PROGRESS)
            .document_id(progress_doc_id(progress.user_id, progress.course_id))
            .object(progress)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add course progress to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            user_id = attempt.user_id,
            quiz_id = attempt.quiz_id,
            attempt_number = attempt.attempt_number,
            "Quiz attempt committed"
        );

        Ok(())
    }
}

fn progress_doc_id(user_id: u64, course_id: u64) -> String {
    format!("{}_{}", user_id, course_id)
}

fn lesson_progress_doc_id(user_id: u64, lesson_id: u64) -> String {
    format!("{}_{}", user_id, lesson_id)
}

fn attempt_doc_id(user_id: u64, quiz_id: u64, attempt_number: u32) -> String {
    format!("{}_{}_{}", user_id, quiz_id, attempt_number)
}
