//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COURSES: &str = "courses";
    pub const LESSONS: &str = "lessons";
    pub const QUIZZES: &str = "quizzes";
    /// Per user x course progress (keyed `{user_id}_{course_id}`)
    pub const COURSE_PROGRESS: &str = "course_progress";
    /// Per user x lesson progress (keyed `{user_id}_{lesson_id}`)
    pub const LESSON_PROGRESS: &str = "lesson_progress";
    /// Append-only quiz attempts (keyed `{user_id}_{quiz_id}_{attempt}`)
    pub const QUIZ_ATTEMPTS: &str = "quiz_attempts";
}
