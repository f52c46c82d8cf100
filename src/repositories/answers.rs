use sqlx::PgPool;

use crate::db::models::Answer;
use crate::repositories::{AnswerUpsert, GradedAnswer};

pub(crate) const COLUMNS: &str = "\
    id, attempt_id, question_id, selected_option_id, numerical_value, \
    is_correct, points_earned, answered_at, last_modified_at";

pub(crate) async fn list_by_attempt(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers WHERE attempt_id = $1 ORDER BY answered_at, id"
    ))
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_attempt(pool: &PgPool, attempt_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE attempt_id = $1")
        .bind(attempt_id)
        .fetch_one(pool)
        .await
}

/// Single-statement upsert; the unique (attempt_id, question_id) constraint
/// serializes concurrent writers for the same pair.
pub(crate) async fn upsert(pool: &PgPool, upsert: AnswerUpsert<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO answers (
            id, attempt_id, question_id, selected_option_id, numerical_value,
            answered_at, last_modified_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$6)
        ON CONFLICT (attempt_id, question_id) DO UPDATE
        SET selected_option_id = EXCLUDED.selected_option_id,
            numerical_value = EXCLUDED.numerical_value,
            last_modified_at = EXCLUDED.last_modified_at",
    )
    .bind(upsert.id)
    .bind(upsert.attempt_id)
    .bind(upsert.question_id)
    .bind(upsert.selected_option_id)
    .bind(upsert.numerical_value)
    .bind(upsert.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn apply_grade(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
    graded: &GradedAnswer,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE answers SET is_correct = $1, points_earned = $2 WHERE id = $3 AND attempt_id = $4",
    )
    .bind(graded.is_correct)
    .bind(graded.points_earned)
    .bind(&graded.answer_id)
    .bind(attempt_id)
    .execute(executor)
    .await?;
    Ok(())
}
