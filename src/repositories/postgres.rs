use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Answer, Attempt, QuestionWithOptions, Quiz};
use crate::repositories::{self, AnswerUpsert, FinalizeAttempt, Store};

#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>> {
        repositories::quizzes::find_by_id(&self.pool, quiz_id).await.context("Failed to fetch quiz")
    }

    async fn list_questions(&self, quiz_id: &str) -> Result<Vec<QuestionWithOptions>> {
        repositories::questions::list_by_quiz(&self.pool, quiz_id)
            .await
            .context("Failed to fetch questions")
    }

    async fn find_question(
        &self,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Option<QuestionWithOptions>> {
        repositories::questions::find_in_quiz(&self.pool, quiz_id, question_id)
            .await
            .context("Failed to fetch question")
    }

    async fn count_questions(&self, quiz_id: &str) -> Result<i64> {
        repositories::questions::count_by_quiz(&self.pool, quiz_id)
            .await
            .context("Failed to count questions")
    }

    async fn find_attempt(&self, attempt_id: &str) -> Result<Option<Attempt>> {
        repositories::attempts::find_by_id(&self.pool, attempt_id)
            .await
            .context("Failed to fetch attempt")
    }

    async fn find_active_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> Result<Option<Attempt>> {
        repositories::attempts::find_active(&self.pool, user_id, quiz_id)
            .await
            .context("Failed to fetch active attempt")
    }

    async fn create_attempt(&self, attempt: &Attempt) -> Result<bool> {
        repositories::attempts::create(&self.pool, attempt)
            .await
            .context("Failed to create attempt")
    }

    async fn set_current_question(&self, attempt_id: &str, index: i32) -> Result<()> {
        repositories::attempts::set_current_question(&self.pool, attempt_id, index)
            .await
            .context("Failed to update current question")
    }

    async fn list_answers(&self, attempt_id: &str) -> Result<Vec<Answer>> {
        repositories::answers::list_by_attempt(&self.pool, attempt_id)
            .await
            .context("Failed to fetch answers")
    }

    async fn count_answers(&self, attempt_id: &str) -> Result<i64> {
        repositories::answers::count_by_attempt(&self.pool, attempt_id)
            .await
            .context("Failed to count answers")
    }

    async fn upsert_answer(&self, upsert: AnswerUpsert<'_>) -> Result<()> {
        repositories::answers::upsert(&self.pool, upsert).await.context("Failed to save answer")
    }

    async fn finalize_attempt(&self, finalize: FinalizeAttempt<'_>) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        let won = repositories::attempts::mark_finalized(
            &mut *tx,
            finalize.attempt_id,
            finalize.status,
            finalize.submitted_at,
            finalize.score,
            finalize.total_points,
        )
        .await
        .context("Failed to transition attempt status")?;

        if !won {
            tx.rollback().await.context("Failed to roll back finalize")?;
            return Ok(false);
        }

        for graded in finalize.graded {
            repositories::answers::apply_grade(&mut *tx, finalize.attempt_id, graded)
                .await
                .context("Failed to persist graded answer")?;
        }

        tx.commit().await.context("Failed to commit finalize")?;
        Ok(true)
    }

    async fn list_expired_attempts(&self, now: PrimitiveDateTime) -> Result<Vec<Attempt>> {
        repositories::attempts::list_expired(&self.pool, now)
            .await
            .context("Failed to list expired attempts")
    }

    async fn list_in_progress_attempts(&self) -> Result<Vec<Attempt>> {
        repositories::attempts::list_in_progress(&self.pool)
            .await
            .context("Failed to list in-progress attempts")
    }

    async fn health(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.context("Database ping failed")?;
        Ok(())
    }
}
