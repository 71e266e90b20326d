// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress tracking: enrollment, lesson completion, quiz attempts, and
//! the spaced-repetition schedule they feed.
//!
//! Reads happen up front; the resulting document mutations are committed
//! together through the database layer's transactional writes.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::progress::AnswerRecord;
use crate::models::{LessonProgress, Quiz, QuizAttempt, UserProgress};
use crate::time_utils::now_rfc3339;

/// Telemetry accompanying a lesson completion.
#[derive(Debug, Clone, Default)]
pub struct LessonTelemetry {
    pub time_spent_minutes: u32,
    pub scroll_percentage: Option<f64>,
    pub interactions: Option<u32>,
    pub notes: Option<String>,
}

/// One submitted answer; `answer_id = None` means the question was
/// skipped.
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub question_id: u64,
    pub answer_id: Option<u64>,
}

/// Service for progress operations.
#[derive(Clone)]
pub struct ProgressService {
    db: FirestoreDb,
}

impl ProgressService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Enroll a user in a course.
    ///
    /// Idempotent: if a progress row already exists it is returned
    /// untouched, so there is exactly one row per user and course no
    /// matter how often enrollment is requested.
    pub async fn enroll(&self, user_id: u64, course_id: u64) -> Result<UserProgress, AppError> {
        let course = self
            .db
            .get_course(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_id)))?;

        if let Some(existing) = self.db.get_progress(user_id, course_id).await? {
            tracing::debug!(user_id, course_id, "Already enrolled, enroll is a no-op");
            return Ok(existing);
        }

        let lessons = self.db.get_lessons_for_course(course_id).await?;
        let progress = UserProgress::new(
            user_id,
            course.id,
            lessons.first().map(|l| l.id),
            lessons.get(1).map(|l| l.id),
            &now_rfc3339(),
        );

        self.db.upsert_progress(&progress).await?;
        tracing::info!(user_id, course_id, "User enrolled");

        Ok(progress)
    }

    /// All course progress rows for a user.
    pub async fn progress_for_user(&self, user_id: u64) -> Result<Vec<UserProgress>, AppError> {
        self.db.get_progress_for_user(user_id).await
    }

    /// Progress in one course; absent means not enrolled.
    pub async fn course_progress(
        &self,
        user_id: u64,
        course_id: u64,
    ) -> Result<UserProgress, AppError> {
        self.db
            .get_progress(user_id, course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not enrolled in this course".to_string()))
    }

    /// Toggle the favorite flag on an enrolled course.
    pub async fn toggle_favorite(
        &self,
        user_id: u64,
        course_id: u64,
    ) -> Result<UserProgress, AppError> {
        let mut progress = self.course_progress(user_id, course_id).await?;
        progress.is_favorited = !progress.is_favorited;
        progress.updated_at = now_rfc3339();
        self.db.upsert_progress(&progress).await?;
        Ok(progress)
    }

    /// Record a completed lesson and fold it into the course totals.
    pub async fn complete_lesson(
        &self,
        user_id: u64,
        lesson_id: u64,
        telemetry: LessonTelemetry,
    ) -> Result<(LessonProgress, UserProgress), AppError> {
        let lesson = self
            .db
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", lesson_id)))?;

        let course = self
            .db
            .get_course(lesson.course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", lesson.course_id)))?;

        let mut progress = self
            .db
            .get_progress(user_id, course.id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Not enrolled in this course".to_string()))?;

        // Pointers advance to the lessons after the one just completed
        let ordered = self.db.get_lessons_for_course(course.id).await?;
        let position = ordered.iter().position(|l| l.id == lesson.id);
        let current = position.and_then(|i| ordered.get(i + 1)).map(|l| l.id);
        let next = position.and_then(|i| ordered.get(i + 2)).map(|l| l.id);

        let now = now_rfc3339();
        let mut lesson_progress = self
            .db
            .get_lesson_progress(user_id, lesson.id)
            .await?
            .unwrap_or_else(|| LessonProgress::new(user_id, lesson.id, &now));

        let newly_completed = lesson_progress.record_completion(
            telemetry.time_spent_minutes,
            telemetry.scroll_percentage,
            telemetry.interactions,
            telemetry.notes,
            &now,
        );

        progress.record_lesson_completion(
            newly_completed,
            telemetry.time_spent_minutes,
            course.total_lessons,
            current,
            next,
            &now,
        );

        self.db
            .write_lesson_completion(&lesson_progress, &progress)
            .await?;

        tracing::info!(
            user_id,
            lesson_id,
            course_id = course.id,
            newly_completed,
            completion = progress.completion_percentage,
            "Lesson completion recorded"
        );

        Ok((lesson_progress, progress))
    }

    /// Grade a quiz submission, append the attempt, and fold the result
    /// into both repetition schedules.
    pub async fn record_quiz_attempt(
        &self,
        user_id: u64,
        quiz_id: u64,
        answers: &[SubmittedAnswer],
        started_at: Option<String>,
    ) -> Result<QuizAttempt, AppError> {
        let quiz = self
            .db
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

        let lesson = self
            .db
            .get_lesson(quiz.lesson_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", quiz.lesson_id)))?;

        let mut progress = self
            .db
            .get_progress(user_id, lesson.course_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Not enrolled in this course".to_string()))?;

        let previous_attempts = self.db.latest_attempt_number(user_id, quiz_id).await?;
        if quiz.max_attempts > 0 && previous_attempts >= quiz.max_attempts {
            return Err(AppError::BadRequest(format!(
                "Attempt limit reached ({} of {})",
                previous_attempts, quiz.max_attempts
            )));
        }

        let now = now_rfc3339();
        let grade = grade_quiz(&quiz, answers);

        let attempt = QuizAttempt {
            user_id,
            quiz_id,
            attempt_number: previous_attempts + 1,
            score: grade.score,
            points_earned: grade.points_earned,
            total_points: grade.total_points,
            is_passed: grade.score >= quiz.passing_score,
            questions_correct: grade.questions_correct,
            questions_incorrect: grade.questions_incorrect,
            questions_skipped: grade.questions_skipped,
            answers: grade.answers,
            concepts_mastered: grade.concepts_mastered,
            concepts_to_review: grade.concepts_to_review,
            started_at,
            completed_at: now.clone(),
            created_at: now.clone(),
        };

        progress.apply_quiz_attempt(&attempt, &now);

        let mut lesson_progress = self
            .db
            .get_lesson_progress(user_id, lesson.id)
            .await?
            .unwrap_or_else(|| LessonProgress::new(user_id, lesson.id, &now));
        lesson_progress.record_review(attempt.score, progress.review_interval_days, &now);

        self.db
            .write_quiz_attempt(&attempt, &lesson_progress, &progress)
            .await?;

        tracing::info!(
            user_id,
            quiz_id,
            attempt_number = attempt.attempt_number,
            score = attempt.score,
            passed = attempt.is_passed,
            "Quiz attempt recorded"
        );

        Ok(attempt)
    }
}

/// The graded outcome of a submission, before it becomes an attempt row.
#[derive(Debug)]
struct QuizGrade {
    answers: Vec<AnswerRecord>,
    points_earned: u32,
    total_points: u32,
    score: f64,
    questions_correct: u32,
    questions_incorrect: u32,
    questions_skipped: u32,
    concepts_mastered: Vec<String>,
    concepts_to_review: Vec<String>,
}

/// Score a submission against the quiz's embedded answer key.
///
/// A concept is mastered when every question tagged with it was answered
/// correctly; one miss (or skip) sends it to the review list instead.
fn grade_quiz(quiz: &Quiz, submitted: &[SubmittedAnswer]) -> QuizGrade {
    let total_points = quiz.total_points();
    let mut answers = Vec::with_capacity(quiz.questions.len());
    let mut points_earned = 0;
    let mut correct = 0;
    let mut incorrect = 0;
    let mut skipped = 0;
    let mut concepts_mastered: Vec<String> = Vec::new();
    let mut concepts_to_review: Vec<String> = Vec::new();

    for question in &quiz.questions {
        let selected = submitted
            .iter()
            .find(|a| a.question_id == question.id)
            .and_then(|a| a.answer_id);

        let is_correct = match selected {
            Some(answer_id) => question.correct_answer_id() == Some(answer_id),
            None => false,
        };

        if is_correct {
            correct += 1;
            points_earned += question.points;
        } else if selected.is_none() {
            skipped += 1;
        } else {
            incorrect += 1;
        }

        for concept in &question.concept_tags {
            let list = if is_correct {
                &mut concepts_mastered
            } else {
                &mut concepts_to_review
            };
            if !list.contains(concept) {
                list.push(concept.clone());
            }
        }

        answers.push(AnswerRecord {
            question_id: question.id,
            selected_answer_id: selected,
            is_correct,
        });
    }

    // A miss on any tagged question outweighs masteries of the same concept
    concepts_mastered.retain(|c| !concepts_to_review.contains(c));

    let score = if total_points == 0 {
        0.0
    } else {
        points_earned as f64 / total_points as f64
    };

    QuizGrade {
        answers,
        points_earned,
        total_points,
        score,
        questions_correct: correct,
        questions_incorrect: incorrect,
        questions_skipped: skipped,
        concepts_mastered,
        concepts_to_review,
    }
}
