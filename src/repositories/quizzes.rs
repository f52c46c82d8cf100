use sqlx::PgPool;

use crate::db::models::Quiz;

pub(crate) const COLUMNS: &str = "\
    id, title, description, duration_minutes, start_time, end_time, \
    published, passing_score, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}
