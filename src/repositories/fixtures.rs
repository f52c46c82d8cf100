//! JSON quiz fixtures for the in-memory backend.
//!
//! Quiz authoring lives in another service; a fixtures file lets a local
//! instance serve attempts without a database.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::core::time::primitive_now_utc;
use crate::db::models::{Question, QuestionOption, QuestionWithOptions, Quiz};
use crate::db::types::QuestionType;
use crate::repositories::memory::MemoryStore;

#[derive(Debug, Deserialize)]
struct QuizFixture {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    duration_minutes: i32,
    #[serde(with = "time::serde::rfc3339")]
    start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end_time: OffsetDateTime,
    #[serde(default)]
    published: bool,
    #[serde(default = "default_passing_score")]
    passing_score: i32,
    #[serde(default)]
    questions: Vec<QuestionFixture>,
}

#[derive(Debug, Deserialize)]
struct QuestionFixture {
    id: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    question_text: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default = "default_points")]
    points: i32,
    order_index: i32,
    #[serde(default)]
    options: Vec<OptionFixture>,
}

#[derive(Debug, Deserialize)]
struct OptionFixture {
    id: String,
    option_text: String,
    #[serde(default)]
    is_correct: bool,
    order_index: i32,
}

fn default_passing_score() -> i32 {
    50
}

fn default_points() -> i32 {
    1
}

fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

/// Loads every quiz in `path` (a JSON array) into `store`. Returns the number of quizzes.
pub(crate) fn load_into(store: &MemoryStore, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read quiz fixtures from {}", path.display()))?;
    let fixtures: Vec<QuizFixture> =
        serde_json::from_str(&raw).context("Failed to parse quiz fixtures")?;

    let count = fixtures.len();
    let created_at = primitive_now_utc();
    for fixture in fixtures {
        let (quiz, questions) = fixture.into_models(created_at);
        store.insert_quiz(quiz, questions);
    }

    Ok(count)
}

impl QuizFixture {
    fn into_models(self, created_at: PrimitiveDateTime) -> (Quiz, Vec<QuestionWithOptions>) {
        let quiz = Quiz {
            id: self.id,
            title: self.title,
            description: self.description,
            duration_minutes: self.duration_minutes,
            start_time: to_primitive_utc(self.start_time),
            end_time: to_primitive_utc(self.end_time),
            published: self.published,
            passing_score: self.passing_score,
            created_at,
        };

        let questions = self
            .questions
            .into_iter()
            .map(|question| {
                let options = question
                    .options
                    .into_iter()
                    .map(|option| QuestionOption {
                        id: option.id,
                        question_id: question.id.clone(),
                        option_text: option.option_text,
                        is_correct: option.is_correct,
                        order_index: option.order_index,
                    })
                    .collect();
                QuestionWithOptions {
                    question: Question {
                        id: question.id,
                        quiz_id: quiz.id.clone(),
                        question_type: question.question_type,
                        question_text: question.question_text,
                        explanation: question.explanation,
                        points: question.points,
                        order_index: question.order_index,
                    },
                    options,
                }
            })
            .collect();

        (quiz, questions)
    }
}
