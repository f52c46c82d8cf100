use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::db::models::{Answer, Attempt, QuestionWithOptions, Quiz};
use crate::db::types::AttemptStatus;
use crate::repositories::{AnswerUpsert, FinalizeAttempt, Store};

#[derive(Default)]
struct Inner {
    quizzes: HashMap<String, Quiz>,
    questions: HashMap<String, Vec<QuestionWithOptions>>,
    attempts: HashMap<String, Attempt>,
    answers: HashMap<(String, String), Answer>,
}

/// Process-local store. Every operation runs under one mutex, which makes
/// the conditional writes (`create_attempt`, `finalize_attempt`,
/// `upsert_answer`) atomic.
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Memory store mutex poisoned; recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn insert_quiz(&self, quiz: Quiz, mut questions: Vec<QuestionWithOptions>) {
        questions.sort_by_key(|item| item.question.order_index);
        for item in &mut questions {
            item.options.sort_by_key(|option| option.order_index);
        }

        let mut inner = self.lock();
        inner.questions.insert(quiz.id.clone(), questions);
        inner.quizzes.insert(quiz.id.clone(), quiz);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>> {
        Ok(self.lock().quizzes.get(quiz_id).cloned())
    }

    async fn list_questions(&self, quiz_id: &str) -> Result<Vec<QuestionWithOptions>> {
        Ok(self.lock().questions.get(quiz_id).cloned().unwrap_or_default())
    }

    async fn find_question(
        &self,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Option<QuestionWithOptions>> {
        Ok(self
            .lock()
            .questions
            .get(quiz_id)
            .and_then(|items| items.iter().find(|item| item.question.id == question_id))
            .cloned())
    }

    async fn count_questions(&self, quiz_id: &str) -> Result<i64> {
        Ok(self.lock().questions.get(quiz_id).map_or(0, |items| items.len() as i64))
    }

    async fn find_attempt(&self, attempt_id: &str) -> Result<Option<Attempt>> {
        Ok(self.lock().attempts.get(attempt_id).cloned())
    }

    async fn find_active_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> Result<Option<Attempt>> {
        Ok(self
            .lock()
            .attempts
            .values()
            .find(|attempt| {
                attempt.user_id == user_id
                    && attempt.quiz_id == quiz_id
                    && attempt.status == AttemptStatus::InProgress
            })
            .cloned())
    }

    async fn create_attempt(&self, attempt: &Attempt) -> Result<bool> {
        let mut inner = self.lock();
        let conflict = inner.attempts.values().any(|existing| {
            existing.id == attempt.id
                || (existing.user_id == attempt.user_id
                    && existing.quiz_id == attempt.quiz_id
                    && existing.status == AttemptStatus::InProgress)
        });
        if conflict {
            return Ok(false);
        }

        inner.attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(true)
    }

    async fn set_current_question(&self, attempt_id: &str, index: i32) -> Result<()> {
        if let Some(attempt) = self.lock().attempts.get_mut(attempt_id) {
            attempt.current_question_index = index;
        }
        Ok(())
    }

    async fn list_answers(&self, attempt_id: &str) -> Result<Vec<Answer>> {
        let mut answers: Vec<Answer> = self
            .lock()
            .answers
            .values()
            .filter(|answer| answer.attempt_id == attempt_id)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.answered_at.cmp(&b.answered_at).then_with(|| a.id.cmp(&b.id)));
        Ok(answers)
    }

    async fn count_answers(&self, attempt_id: &str) -> Result<i64> {
        Ok(self.lock().answers.values().filter(|answer| answer.attempt_id == attempt_id).count()
            as i64)
    }

    async fn upsert_answer(&self, upsert: AnswerUpsert<'_>) -> Result<()> {
        let key = (upsert.attempt_id.to_string(), upsert.question_id.to_string());
        let mut inner = self.lock();

        match inner.answers.get_mut(&key) {
            Some(existing) => {
                existing.selected_option_id = upsert.selected_option_id.map(str::to_string);
                existing.numerical_value = upsert.numerical_value;
                existing.last_modified_at = upsert.now;
            }
            None => {
                inner.answers.insert(
                    key,
                    Answer {
                        id: upsert.id.to_string(),
                        attempt_id: upsert.attempt_id.to_string(),
                        question_id: upsert.question_id.to_string(),
                        selected_option_id: upsert.selected_option_id.map(str::to_string),
                        numerical_value: upsert.numerical_value,
                        is_correct: None,
                        points_earned: None,
                        answered_at: upsert.now,
                        last_modified_at: upsert.now,
                    },
                );
            }
        }

        Ok(())
    }

    async fn finalize_attempt(&self, finalize: FinalizeAttempt<'_>) -> Result<bool> {
        let mut inner = self.lock();

        let Some(attempt) = inner.attempts.get_mut(finalize.attempt_id) else {
            return Ok(false);
        };
        if attempt.status != AttemptStatus::InProgress {
            return Ok(false);
        }

        attempt.status = finalize.status;
        attempt.submitted_at = Some(finalize.submitted_at);
        attempt.score = Some(finalize.score);
        attempt.total_points = Some(finalize.total_points);

        for graded in finalize.graded {
            if let Some(answer) = inner.answers.values_mut().find(|answer| {
                answer.id == graded.answer_id && answer.attempt_id == finalize.attempt_id
            }) {
                answer.is_correct = Some(graded.is_correct);
                answer.points_earned = Some(graded.points_earned);
            }
        }

        Ok(true)
    }

    async fn list_expired_attempts(&self, now: PrimitiveDateTime) -> Result<Vec<Attempt>> {
        let mut expired: Vec<Attempt> = self
            .lock()
            .attempts
            .values()
            .filter(|attempt| {
                attempt.status == AttemptStatus::InProgress && attempt.expires_at <= now
            })
            .cloned()
            .collect();
        expired.sort_by_key(|attempt| attempt.expires_at);
        Ok(expired)
    }

    async fn list_in_progress_attempts(&self) -> Result<Vec<Attempt>> {
        Ok(self
            .lock()
            .attempts
            .values()
            .filter(|attempt| attempt.status == AttemptStatus::InProgress)
            .cloned()
            .collect())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}
