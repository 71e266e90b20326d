// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course content models, read by the progress tracker.
//!
//! Authoring happens outside this service; these documents are consumed
//! read-only when recording enrollment, lesson completion, and quiz
//! attempts.

use serde::{Deserialize, Serialize};

/// A course: an ordered sequence of short lessons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course ID (also used as document ID)
    pub id: u64,
    pub title: String,
    pub description: String,
    pub topic: String,
    /// beginner, intermediate, advanced
    pub difficulty_level: String,
    pub slug: String,
    /// Number of lessons the course is declared to contain.
    /// Completion percentage is computed against this.
    pub total_lessons: u32,
    pub estimated_duration_minutes: u32,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A single micro-lesson within a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson ID (also used as document ID)
    pub id: u64,
    pub course_id: u64,
    pub title: String,
    pub content: String,
    /// Position within the course's ordered lesson sequence
    pub order_index: u32,
    pub duration_minutes: u32,
    /// Concepts this lesson teaches, fed into the review schedule
    #[serde(default)]
    pub key_concepts: Vec<String>,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A lesson's assessment. At most one quiz per lesson; questions and
/// answers are embedded in order, so scoring needs a single read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    /// Quiz ID (also used as document ID)
    pub id: u64,
    pub lesson_id: u64,
    pub title: String,
    /// Fraction of points required to pass (0.0-1.0)
    pub passing_score: f64,
    /// Maximum attempts per user; 0 means unlimited
    pub max_attempts: u32,
    pub questions: Vec<QuizQuestion>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Question ID, unique within the quiz
    pub id: u64,
    pub text: String,
    pub points: u32,
    /// Concepts this question tests, for spaced repetition
    #[serde(default)]
    pub concept_tags: Vec<String>,
    /// Ordered options; exactly one has `is_correct`
    pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswer {
    /// Answer ID, unique within the question
    pub id: u64,
    pub text: String,
    pub is_correct: bool,
}

impl Quiz {
    /// Total points across all questions.
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

impl QuizQuestion {
    /// The ID of this question's correct answer.
    pub fn correct_answer_id(&self) -> Option<u64> {
        self.answers.iter().find(|a| a.is_correct).map(|a| a.id)
    }
}
