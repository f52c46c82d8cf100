use std::collections::HashMap;

use sqlx::PgPool;

use crate::db::models::{Question, QuestionOption, QuestionWithOptions};

pub(crate) const COLUMNS: &str =
    "id, quiz_id, question_type, question_text, explanation, points, order_index";

const OPTION_COLUMNS: &str = "o.id, o.question_id, o.option_text, o.is_correct, o.order_index";

pub(crate) async fn list_by_quiz(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuestionWithOptions>, sqlx::Error> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE quiz_id = $1 ORDER BY order_index, id"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    let options = sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options o \
         JOIN questions q ON q.id = o.question_id \
         WHERE q.quiz_id = $1 \
         ORDER BY o.order_index, o.id"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    let mut by_question: HashMap<String, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id.clone()).or_default().push(option);
    }

    Ok(questions
        .into_iter()
        .map(|question| {
            let options = by_question.remove(&question.id).unwrap_or_default();
            QuestionWithOptions { question, options }
        })
        .collect())
}

pub(crate) async fn find_in_quiz(
    pool: &PgPool,
    quiz_id: &str,
    question_id: &str,
) -> Result<Option<QuestionWithOptions>, sqlx::Error> {
    let question = sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = $1 AND quiz_id = $2"
    ))
    .bind(question_id)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?;

    let Some(question) = question else {
        return Ok(None);
    };

    let options = sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options o \
         WHERE o.question_id = $1 ORDER BY o.order_index, o.id"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(QuestionWithOptions { question, options }))
}

pub(crate) async fn count_by_quiz(pool: &PgPool, quiz_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(pool)
        .await
}
