use sqlx::PgPool;

use crate::db::models::Attempt;
use crate::db::types::AttemptStatus;

pub(crate) const COLUMNS: &str = "\
    id, user_id, quiz_id, status, started_at, expires_at, submitted_at, \
    score, total_points, current_question_index";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: &str,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts \
         WHERE user_id = $1 AND quiz_id = $2 AND status = $3"
    ))
    .bind(user_id)
    .bind(quiz_id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

/// Relies on the partial unique index over in-progress (user, quiz) pairs.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: &Attempt,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (
            id, user_id, quiz_id, status, started_at, expires_at, current_question_index
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)
        ON CONFLICT DO NOTHING",
    )
    .bind(&attempt.id)
    .bind(&attempt.user_id)
    .bind(&attempt.quiz_id)
    .bind(attempt.status)
    .bind(attempt.started_at)
    .bind(attempt.expires_at)
    .bind(attempt.current_question_index)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn set_current_question(
    pool: &PgPool,
    id: &str,
    index: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quiz_attempts SET current_question_index = $1 WHERE id = $2 AND status = $3",
    )
    .bind(index)
    .bind(id)
    .bind(AttemptStatus::InProgress)
    .execute(pool)
    .await?;
    Ok(())
}

/// Compare-and-set out of `InProgress`. Returns whether this call won.
pub(crate) async fn mark_finalized(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: AttemptStatus,
    submitted_at: time::PrimitiveDateTime,
    score: i32,
    total_points: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_attempts
         SET status = $1, submitted_at = $2, score = $3, total_points = $4
         WHERE id = $5 AND status = $6",
    )
    .bind(status)
    .bind(submitted_at)
    .bind(score)
    .bind(total_points)
    .bind(id)
    .bind(AttemptStatus::InProgress)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_expired(
    pool: &PgPool,
    now: time::PrimitiveDateTime,
) -> Result<Vec<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts \
         WHERE status = $1 AND expires_at <= $2 \
         ORDER BY expires_at"
    ))
    .bind(AttemptStatus::InProgress)
    .bind(now)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_in_progress(pool: &PgPool) -> Result<Vec<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE status = $1"
    ))
    .bind(AttemptStatus::InProgress)
    .fetch_all(pool)
    .await
}
