//! Persistence collaborators.
//!
//! The attempt lifecycle only talks to [`Store`]; `memory` keeps everything in
//! process and `postgres` delegates to the per-table query modules below.

pub(crate) mod answers;
pub(crate) mod attempts;
pub(crate) mod fixtures;
pub(crate) mod memory;
pub(crate) mod postgres;
pub(crate) mod questions;
pub(crate) mod quizzes;

use anyhow::Result;
use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::db::models::{Answer, Attempt, QuestionWithOptions, Quiz};
use crate::db::types::AttemptStatus;

/// Selection written by an answer upsert. `id` is only used when the
/// (attempt, question) pair has no answer yet.
#[derive(Debug, Clone)]
pub(crate) struct AnswerUpsert<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_option_id: Option<&'a str>,
    pub(crate) numerical_value: Option<f64>,
    pub(crate) now: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradedAnswer {
    pub(crate) answer_id: String,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct FinalizeAttempt<'a> {
    pub(crate) attempt_id: &'a str,
    pub(crate) status: AttemptStatus,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) graded: &'a [GradedAnswer],
}

#[async_trait]
pub(crate) trait Store: Send + Sync {
    async fn find_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>>;

    /// Questions of a quiz ordered by `order_index`, each with ordered options.
    async fn list_questions(&self, quiz_id: &str) -> Result<Vec<QuestionWithOptions>>;

    async fn find_question(
        &self,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Option<QuestionWithOptions>>;

    async fn count_questions(&self, quiz_id: &str) -> Result<i64>;

    async fn find_attempt(&self, attempt_id: &str) -> Result<Option<Attempt>>;

    async fn find_active_attempt(&self, user_id: &str, quiz_id: &str)
        -> Result<Option<Attempt>>;

    /// Inserts an in-progress attempt. Returns `false` without writing when the
    /// (user, quiz) pair already has an in-progress attempt.
    async fn create_attempt(&self, attempt: &Attempt) -> Result<bool>;

    async fn set_current_question(&self, attempt_id: &str, index: i32) -> Result<()>;

    async fn list_answers(&self, attempt_id: &str) -> Result<Vec<Answer>>;

    async fn count_answers(&self, attempt_id: &str) -> Result<i64>;

    /// Creates or overwrites the single answer for (attempt, question).
    /// `answered_at` survives overwrites; grading fields are never touched.
    async fn upsert_answer(&self, upsert: AnswerUpsert<'_>) -> Result<()>;

    /// Moves an attempt out of `InProgress` and persists its grading as one
    /// unit. Returns `false` when the attempt had already left `InProgress`,
    /// in which case nothing is written.
    async fn finalize_attempt(&self, finalize: FinalizeAttempt<'_>) -> Result<bool>;

    /// In-progress attempts whose `expires_at` is at or before `now`.
    async fn list_expired_attempts(&self, now: PrimitiveDateTime) -> Result<Vec<Attempt>>;

    async fn list_in_progress_attempts(&self) -> Result<Vec<Attempt>>;

    async fn health(&self) -> Result<()>;
}
