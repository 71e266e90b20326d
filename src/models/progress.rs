// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress tracking models and their mutation logic.
//!
//! These documents are updated atomically with the writes that produce
//! them (lesson completions, quiz attempts) via Firestore transactions.
//! The mutation methods here are pure so the invariants can be tested
//! without a database: completion percentage stays derivable from
//! `lessons_completed / total_lessons`, streaks follow calendar days, and
//! the review interval grows on success and resets on failure.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::{date_of, day_step, DayStep};

/// Longest the course-level review interval is allowed to grow (days).
pub const REVIEW_INTERVAL_CAP_DAYS: u32 = 60;

/// Smoothing factor pulling lesson mastery toward the latest quiz score.
pub const MASTERY_SMOOTHING: f64 = 0.3;

/// Per-user, per-course progress.
///
/// Stored at `course_progress/{user_id}_{course_id}`; row existence means
/// the user enrolled at some point, `is_enrolled` tracks whether they
/// still are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: u64,
    pub course_id: u64,

    /// Redundant with `lessons_completed / course.total_lessons`, stored
    /// for cheap dashboard reads. Every mutation recomputes it.
    pub completion_percentage: f64,
    pub lessons_completed: u32,
    pub total_time_spent_minutes: u32,

    /// Pointers along the course's ordered lesson sequence
    pub current_lesson_id: Option<u64>,
    pub next_lesson_id: Option<u64>,

    pub streak_days: u32,
    /// Last activity timestamp (ISO 8601), drives streak accounting
    pub last_activity_date: Option<String>,

    pub is_enrolled: bool,
    pub is_completed: bool,
    pub is_favorited: bool,

    // Spaced repetition (course level)
    /// Concepts currently due for review
    #[serde(default)]
    pub concepts_to_review: Vec<String>,
    pub next_review_date: Option<String>,
    pub review_interval_days: u32,

    pub enrolled_at: String,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

impl UserProgress {
    /// Fresh enrollment row pointing at the start of the lesson sequence.
    pub fn new(
        user_id: u64,
        course_id: u64,
        first_lesson_id: Option<u64>,
        second_lesson_id: Option<u64>,
        now: &str,
    ) -> Self {
        Self {
            user_id,
            course_id,
            completion_percentage: 0.0,
            lessons_completed: 0,
            total_time_spent_minutes: 0,
            current_lesson_id: first_lesson_id,
            next_lesson_id: second_lesson_id,
            streak_days: 0,
            last_activity_date: None,
            is_enrolled: true,
            is_completed: false,
            is_favorited: false,
            concepts_to_review: Vec::new(),
            next_review_date: None,
            review_interval_days: 1,
            enrolled_at: now.to_string(),
            completed_at: None,
            updated_at: now.to_string(),
        }
    }

    /// Fold a lesson completion into the course totals.
    ///
    /// `newly_completed` is false when the user re-completes a lesson they
    /// already finished; telemetry still accumulates but the counters and
    /// pointers stay put, so `lessons_completed` can never drift past
    /// `total_lessons`.
    pub fn record_lesson_completion(
        &mut self,
        newly_completed: bool,
        time_spent_minutes: u32,
        total_lessons: u32,
        current_lesson_id: Option<u64>,
        next_lesson_id: Option<u64>,
        now: &str,
    ) {
        self.total_time_spent_minutes += time_spent_minutes;
        self.touch_activity(now);

        if newly_completed {
            self.lessons_completed = (self.lessons_completed + 1).min(total_lessons.max(1));
            self.completion_percentage = if total_lessons == 0 {
                0.0
            } else {
                (self.lessons_completed as f64 / total_lessons as f64) * 100.0
            };
            self.current_lesson_id = current_lesson_id;
            self.next_lesson_id = next_lesson_id;

            if total_lessons > 0 && self.lessons_completed >= total_lessons {
                self.is_completed = true;
                self.completed_at = Some(now.to_string());
            }
        }

        self.updated_at = now.to_string();
    }

    /// Fold a quiz attempt into the course-level review schedule.
    ///
    /// Missed concepts become due and reset the interval to one day; a
    /// clean attempt doubles it (capped). Mastered concepts are pruned
    /// from the due list.
    pub fn apply_quiz_attempt(&mut self, attempt: &QuizAttempt, now: &str) {
        for concept in &attempt.concepts_to_review {
            if !self.concepts_to_review.contains(concept) {
                self.concepts_to_review.push(concept.clone());
            }
        }
        self.concepts_to_review
            .retain(|c| !attempt.concepts_mastered.contains(c));

        if attempt.is_passed && attempt.concepts_to_review.is_empty() {
            self.review_interval_days =
                (self.review_interval_days * 2).min(REVIEW_INTERVAL_CAP_DAYS);
        } else {
            self.review_interval_days = 1;
        }
        self.next_review_date = add_days(now, self.review_interval_days);

        self.touch_activity(now);
        self.updated_at = now.to_string();
    }

    /// Update the streak counter against the last activity date.
    fn touch_activity(&mut self, now: &str) {
        let today = date_of(now);
        let last = self.last_activity_date.as_deref().and_then(date_of);

        self.streak_days = match (last, today) {
            (Some(last), Some(today)) => match day_step(last, today) {
                DayStep::SameDay => self.streak_days.max(1),
                DayStep::NextDay => self.streak_days + 1,
                DayStep::Gap => 1,
            },
            _ => 1,
        };
        self.last_activity_date = Some(now.to_string());
    }
}

/// Per-user, per-lesson progress with its own finer-grained repetition
/// state, independent of the course-level schedule.
///
/// Stored at `lesson_progress/{user_id}_{lesson_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    pub user_id: u64,
    pub lesson_id: u64,

    pub is_completed: bool,
    pub completion_percentage: f64,
    pub time_spent_minutes: u32,

    // Interaction telemetry
    pub scroll_percentage: f64,
    pub interaction_count: u32,
    pub user_notes: Option<String>,

    // Spaced repetition (lesson level)
    /// Estimated grasp of this lesson's material (0.0-1.0)
    pub mastery_level: f64,
    pub next_review_date: Option<String>,
    pub review_count: u32,

    pub first_accessed: String,
    pub last_accessed: String,
}

impl LessonProgress {
    pub fn new(user_id: u64, lesson_id: u64, now: &str) -> Self {
        Self {
            user_id,
            lesson_id,
            is_completed: false,
            completion_percentage: 0.0,
            time_spent_minutes: 0,
            scroll_percentage: 0.0,
            interaction_count: 0,
            user_notes: None,
            mastery_level: 0.0,
            next_review_date: None,
            review_count: 0,
            first_accessed: now.to_string(),
            last_accessed: now.to_string(),
        }
    }

    /// Mark the lesson completed and absorb telemetry.
    ///
    /// Returns `true` if this is the first completion (the caller uses
    /// that to decide whether the parent course counters move).
    pub fn record_completion(
        &mut self,
        time_spent_minutes: u32,
        scroll_percentage: Option<f64>,
        interactions: Option<u32>,
        notes: Option<String>,
        now: &str,
    ) -> bool {
        let first_time = !self.is_completed;

        self.is_completed = true;
        self.completion_percentage = 100.0;
        self.time_spent_minutes += time_spent_minutes;
        if let Some(scroll) = scroll_percentage {
            self.scroll_percentage = self.scroll_percentage.max(scroll.clamp(0.0, 100.0));
        }
        if let Some(n) = interactions {
            self.interaction_count += n;
        }
        if notes.is_some() {
            self.user_notes = notes;
        }
        self.last_accessed = now.to_string();

        first_time
    }

    /// Fold a quiz score into the lesson's mastery estimate.
    ///
    /// Mastery moves toward the attempt score by `MASTERY_SMOOTHING`, so
    /// it climbs with repeated success and sinks after failures without
    /// ever leaving 0.0-1.0.
    pub fn record_review(&mut self, score: f64, interval_days: u32, now: &str) {
        let score = score.clamp(0.0, 1.0);
        self.mastery_level =
            (self.mastery_level + (score - self.mastery_level) * MASTERY_SMOOTHING).clamp(0.0, 1.0);
        self.review_count += 1;
        self.next_review_date = add_days(now, interval_days);
        self.last_accessed = now.to_string();
    }
}

/// One graded quiz submission. Append-only.
///
/// Stored at `quiz_attempts/{user_id}_{quiz_id}_{attempt_number}`;
/// `attempt_number` starts at 1 and increases by one per (user, quiz).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub user_id: u64,
    pub quiz_id: u64,
    pub attempt_number: u32,

    /// Fraction of points earned (0.0-1.0)
    pub score: f64,
    pub points_earned: u32,
    pub total_points: u32,
    /// score >= quiz.passing_score
    pub is_passed: bool,

    pub questions_correct: u32,
    pub questions_incorrect: u32,
    pub questions_skipped: u32,
    pub answers: Vec<AnswerRecord>,

    // Spaced repetition feedback
    /// Concepts where every tagged question was answered correctly
    #[serde(default)]
    pub concepts_mastered: Vec<String>,
    /// Concepts with at least one miss, now due for review
    #[serde(default)]
    pub concepts_to_review: Vec<String>,

    pub started_at: Option<String>,
    pub completed_at: String,
    pub created_at: String,
}

/// The grading of a single question within an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: u64,
    /// `None` means the question was skipped
    pub selected_answer_id: Option<u64>,
    pub is_correct: bool,
}

/// `now + days`, in the storage timestamp format.
fn add_days(now: &str, days: u32) -> Option<String> {
    DateTime::parse_from_rfc3339(now)
        .ok()
        .map(|dt| dt.with_timezone(&Utc) + Duration::days(days as i64))
        .map(crate::time_utils::format_utc_rfc3339)
}
