use sqlx::Row;

fn database_url() -> String {
    // Integration tests don't go through the app config.
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }

    let server = std::env::var("POSTGRES_SERVER").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "quizglass".into());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "quizglass".into());

    format!("postgresql://{user}:{password}@{server}:{port}/{db}")
}

async fn migrated_pool() -> anyhow::Result<sqlx::PgPool> {
    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url()).await?;

    let migrations_dir =
        std::env::var("QUIZGLASS_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    Ok(pool)
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let pool = migrated_pool().await?;

    for table in ["quizzes", "questions", "question_options", "quiz_attempts", "answers"] {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn only_one_in_progress_attempt_per_user_and_quiz() -> anyhow::Result<()> {
    let pool = migrated_pool().await?;
    let quiz_id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO quizzes (id, title, duration_minutes, start_time, end_time, published,
            passing_score, created_at)
         VALUES ($1, 'Smoke', 10, now() - interval '1 hour', now() + interval '1 hour', true,
            50, now())",
    )
    .bind(&quiz_id)
    .execute(&pool)
    .await?;

    let insert = "INSERT INTO quiz_attempts (id, user_id, quiz_id, status, started_at, expires_at,
            current_question_index)
         VALUES ($1, 'smoke-user', $2, 'in_progress', now(), now() + interval '10 minutes', 0)";

    sqlx::query(insert).bind(uuid::Uuid::new_v4().to_string()).bind(&quiz_id).execute(&pool).await?;
    let second =
        sqlx::query(insert).bind(uuid::Uuid::new_v4().to_string()).bind(&quiz_id).execute(&pool).await;
    assert!(second.is_err(), "partial unique index should reject a second in-progress attempt");

    sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(&quiz_id).execute(&pool).await?;
    Ok(())
}
