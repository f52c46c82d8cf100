//! Attempt lifecycle: start, answer, finalize.
//!
//! Every path that ends an attempt goes through [`AttemptService::finalize`].
//! Two guards keep grading exactly-once: a per-attempt write lock in this
//! process and the store's compare-and-set on `status = in_progress`.
//! Checks run in a fixed order: ownership, state, expiry, input.

mod errors;
mod locks;
pub(crate) mod results;


use std::cmp::min;
use std::sync::Arc;

use async_trait::async_trait;
use time::Duration;
use uuid::Uuid;

pub(crate) use errors::{AttemptError, ErrorKind};
use locks::AttemptLocks;

use crate::core::time::{format_primitive, Clock};
use crate::db::models::{Attempt, QuestionWithOptions};
use crate::db::types::AttemptStatus;
use crate::repositories::{FinalizeAttempt, Store};
use crate::schemas::attempt::{
    AnswerSavedResponse, AttemptQuestionResponse, AttemptResultResponse, ExpireAttemptsResponse,
    QuestionView, StartAttemptResponse,
};
use crate::services::answer_store::{AnswerSelection, AnswerStore};
use crate::services::timer_registry::{ExpiryHandler, TimerRegistry};

pub(crate) type AttemptResult<T> = Result<T, AttemptError>;

/// Raw answer payload before it is checked against the question.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AnswerInput {
    pub(crate) selected_option_id: Option<String>,
    pub(crate) numerical_value: Option<f64>,
}

pub(crate) struct AttemptService {
    store: Arc<dyn Store>,
    answers: AnswerStore,
    timers: Arc<TimerRegistry>,
    clock: Arc<dyn Clock>,
    locks: AttemptLocks,
}

impl AttemptService {
    pub(crate) fn new(
        store: Arc<dyn Store>,
        timers: Arc<TimerRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            answers: AnswerStore::new(store.clone(), clock.clone()),
            store,
            timers,
            clock,
            locks: AttemptLocks::default(),
        }
    }

    pub(crate) async fn start_attempt(
        &self,
        quiz_id: &str,
        user_id: &str,
    ) -> AttemptResult<StartAttemptResponse> {
        let quiz = self.store.find_quiz(quiz_id).await?.ok_or(AttemptError::NotFound("Quiz"))?;
        let now = self.clock.now();

        // Overdue attempts are closed by the timer sweep or the catch-up path.
        if self.store.find_active_attempt(user_id, quiz_id).await?.is_some() {
            return Err(AttemptError::AlreadyActive);
        }

        if !quiz.accepts_attempts_at(now) {
            return Err(AttemptError::QuizNotActive);
        }

        let expires_at =
            min(now + Duration::minutes(i64::from(quiz.duration_minutes)), quiz.end_time);
        let attempt = Attempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz.id.clone(),
            status: AttemptStatus::InProgress,
            started_at: now,
            expires_at,
            submitted_at: None,
            score: None,
            total_points: None,
            current_question_index: 0,
        };

        if !self.store.create_attempt(&attempt).await? {
            return Err(AttemptError::AlreadyActive);
        }
        self.timers.register(&attempt.id, attempt.expires_at);

        let questions = self.store.list_questions(&quiz.id).await?;
        metrics::counter!("attempts_started_total").increment(1);
        tracing::info!(
            attempt_id = %attempt.id,
            user_id,
            quiz_id = %quiz.id,
            expires_at = %format_primitive(expires_at),
            "Attempt started"
        );

        Ok(StartAttemptResponse {
            attempt_id: attempt.id,
            quiz_id: quiz.id,
            title: quiz.title,
            duration_minutes: quiz.duration_minutes,
            started_at: format_primitive(attempt.started_at),
            expires_at: format_primitive(attempt.expires_at),
            total_questions: questions.len() as i64,
            first_question: questions.first().map(QuestionView::from),
        })
    }

    pub(crate) async fn get_question(
        &self,
        attempt_id: &str,
        user_id: &str,
        index: i64,
    ) -> AttemptResult<AttemptQuestionResponse> {
        let lock = self.locks.handle(attempt_id);
        let guard = lock.read().await;

        let attempt = self.load_owned(attempt_id, user_id).await?;
        if let Err(err) = self.ensure_answerable(&attempt) {
            drop(guard);
            return Err(self.close_if_expired(&attempt, err).await);
        }

        let questions = self.store.list_questions(&attempt.quiz_id).await?;
        let count = questions.len() as i64;
        let question = usize::try_from(index)
            .ok()
            .and_then(|position| questions.get(position))
            .ok_or(AttemptError::InvalidIndex { index, count })?;

        // Guarded by the range check above.
        let position = index as i32;
        if attempt.current_question_index != position {
            self.store.set_current_question(&attempt.id, position).await?;
        }

        Ok(AttemptQuestionResponse {
            attempt_id: attempt.id,
            question_index: index,
            total_questions: count,
            expires_at: format_primitive(attempt.expires_at),
            question: QuestionView::from(question),
        })
    }

    pub(crate) async fn submit_answer(
        &self,
        attempt_id: &str,
        user_id: &str,
        question_id: &str,
        input: AnswerInput,
    ) -> AttemptResult<AnswerSavedResponse> {
        let lock = self.locks.handle(attempt_id);
        let guard = lock.read().await;

        let attempt = self.load_owned(attempt_id, user_id).await?;
        if let Err(err) = self.ensure_answerable(&attempt) {
            drop(guard);
            return Err(self.close_if_expired(&attempt, err).await);
        }

        let question = self
            .store
            .find_question(&attempt.quiz_id, question_id)
            .await?
            .ok_or(AttemptError::NotFound("Question"))?;
        let selection = resolve_selection(&question, input)?;

        self.answers.upsert(&attempt.id, &question.question.id, &selection).await?;
        let answered_count = self.answers.answered_count(&attempt.id).await?;
        let total_questions = self.store.count_questions(&attempt.quiz_id).await?;

        tracing::debug!(
            attempt_id = %attempt.id,
            question_id,
            answered_count,
            "Answer saved"
        );

        Ok(AnswerSavedResponse {
            saved: true,
            message: "Answer saved".to_string(),
            answered_count,
            total_questions,
        })
    }

    /// User-initiated submission. Losing a race against the expiry path
    /// yields the result that path produced.
    pub(crate) async fn submit(
        &self,
        attempt_id: &str,
        user_id: &str,
    ) -> AttemptResult<AttemptResultResponse> {
        let attempt = self.load_owned(attempt_id, user_id).await?;
        if attempt.status.is_terminal() {
            return Err(AttemptError::AlreadyFinalized);
        }

        let lock = self.locks.handle(attempt_id);
        let _guard = lock.write().await;

        let attempt = self.load_owned(attempt_id, user_id).await?;
        if attempt.status.is_terminal() {
            self.locks.forget(attempt_id);
            return self.result_for(&attempt).await;
        }

        self.finalize(&attempt, AttemptStatus::Submitted).await
    }

    /// Expiry-driven finalization. Returns `None` when the attempt had
    /// already been finalized.
    pub(crate) async fn auto_submit(
        &self,
        attempt_id: &str,
    ) -> AttemptResult<Option<AttemptResultResponse>> {
        let lock = self.locks.handle(attempt_id);
        let _guard = lock.write().await;

        let attempt =
            self.store.find_attempt(attempt_id).await?.ok_or(AttemptError::NotFound("Attempt"))?;
        if attempt.status.is_terminal() {
            self.timers.cancel(attempt_id);
            self.locks.forget(attempt_id);
            return Ok(None);
        }

        self.finalize(&attempt, AttemptStatus::AutoSubmitted).await.map(Some)
    }

    /// Caller must hold the attempt's write lock.
    async fn finalize(
        &self,
        attempt: &Attempt,
        status: AttemptStatus,
    ) -> AttemptResult<AttemptResultResponse> {
        self.timers.cancel(&attempt.id);

        let questions = self.store.list_questions(&attempt.quiz_id).await?;
        let answers = self.store.list_answers(&attempt.id).await?;
        let grading = results::grade_answers(&questions, &answers);

        let finalize = FinalizeAttempt {
            attempt_id: &attempt.id,
            status,
            submitted_at: self.clock.now(),
            score: grading.score,
            total_points: grading.total_points,
            graded: &grading.graded,
        };

        let won = match self.store.finalize_attempt(finalize).await {
            Ok(won) => won,
            Err(err) => {
                // Still in progress; keep it visible to the sweep.
                self.timers.register(&attempt.id, attempt.expires_at);
                return Err(err.into());
            }
        };
        self.locks.forget(&attempt.id);

        if won {
            metrics::counter!("attempts_finalized_total", "status" => status.as_str())
                .increment(1);
            tracing::info!(
                attempt_id = %attempt.id,
                user_id = %attempt.user_id,
                status = status.as_str(),
                score = grading.score,
                total_points = grading.total_points,
                "Attempt finalized"
            );
        } else {
            tracing::debug!(attempt_id = %attempt.id, "Attempt finalized elsewhere");
        }

        let stored =
            self.store.find_attempt(&attempt.id).await?.ok_or(AttemptError::NotFound("Attempt"))?;
        self.result_for(&stored).await
    }

    pub(crate) async fn get_result(
        &self,
        attempt_id: &str,
        user_id: &str,
    ) -> AttemptResult<AttemptResultResponse> {
        let attempt = self.load_owned(attempt_id, user_id).await?;
        if !attempt.status.is_terminal() {
            return Err(AttemptError::StillInProgress);
        }
        self.result_for(&attempt).await
    }

    /// Catch-up path for in-progress attempts past their deadline that the
    /// timer registry no longer tracks. One failure never stops the batch.
    pub(crate) async fn process_expired_attempts(&self) -> AttemptResult<ExpireAttemptsResponse> {
        let expired = self.store.list_expired_attempts(self.clock.now()).await?;
        if expired.is_empty() {
            return Ok(ExpireAttemptsResponse::default());
        }

        let mut report = ExpireAttemptsResponse::default();
        for attempt in &expired {
            match self.auto_submit(&attempt.id).await {
                Ok(Some(_)) => report.closed += 1,
                Ok(None) => {}
                Err(err) => {
                    report.failed += 1;
                    metrics::counter!("expiry_failures_total").increment(1);
                    tracing::error!(
                        attempt_id = %attempt.id,
                        error = %err,
                        "Failed to close expired attempt"
                    );
                }
            }
        }

        tracing::info!(
            found = expired.len(),
            closed = report.closed,
            failed = report.failed,
            "Closed expired attempts"
        );
        metrics::counter!("expired_attempts_closed_total").increment(report.closed as u64);

        Ok(report)
    }

    /// Re-registers every in-progress attempt; used after a restart.
    pub(crate) async fn restore_timers(&self) -> AttemptResult<usize> {
        let attempts = self.store.list_in_progress_attempts().await?;
        for attempt in &attempts {
            self.timers.register(&attempt.id, attempt.expires_at);
        }
        Ok(attempts.len())
    }

    /// Ownership check for user-facing calls; another user's attempt is
    /// indistinguishable from a missing one.
    pub(crate) async fn load_owned(
        &self,
        attempt_id: &str,
        user_id: &str,
    ) -> AttemptResult<Attempt> {
        match self.store.find_attempt(attempt_id).await? {
            Some(attempt) if attempt.user_id == user_id => Ok(attempt),
            _ => Err(AttemptError::NotFound("Attempt")),
        }
    }

    fn ensure_answerable(&self, attempt: &Attempt) -> AttemptResult<()> {
        if attempt.status.is_terminal() {
            return Err(AttemptError::NotInProgress);
        }
        if attempt.is_expired_at(self.clock.now()) {
            return Err(AttemptError::Expired);
        }
        Ok(())
    }

    /// Maps a failed answerability check to the caller's error, closing the
    /// attempt first when it ran out of time. Must be called without the
    /// attempt lock held.
    async fn close_if_expired(&self, attempt: &Attempt, err: AttemptError) -> AttemptError {
        if matches!(err, AttemptError::NotInProgress) {
            self.locks.forget(&attempt.id);
        }
        if matches!(err, AttemptError::Expired) {
            if let Err(close_err) = self.auto_submit(&attempt.id).await {
                tracing::error!(
                    attempt_id = %attempt.id,
                    error = %close_err,
                    "Failed to auto-submit expired attempt"
                );
            }
        }
        err
    }

    async fn result_for(&self, attempt: &Attempt) -> AttemptResult<AttemptResultResponse> {
        let quiz = self
            .store
            .find_quiz(&attempt.quiz_id)
            .await?
            .ok_or(AttemptError::NotFound("Quiz"))?;
        let questions = self.store.list_questions(&attempt.quiz_id).await?;
        let answers = self.store.list_answers(&attempt.id).await?;
        Ok(results::build(&quiz, attempt, &questions, &answers))
    }
}

#[async_trait]
impl ExpiryHandler for AttemptService {
    async fn auto_submit(&self, attempt_id: &str) -> anyhow::Result<()> {
        AttemptService::auto_submit(self, attempt_id).await?;
        Ok(())
    }
}

/// Checks a raw payload against the question's type and option set.
fn resolve_selection(
    question: &QuestionWithOptions,
    input: AnswerInput,
) -> AttemptResult<AnswerSelection> {
    if question.question.question_type.is_choice() {
        if input.numerical_value.is_some() {
            return Err(AttemptError::InvalidAnswer(
                "Choice questions take selected_option_id only".to_string(),
            ));
        }
        let option_id = input.selected_option_id.ok_or_else(|| {
            AttemptError::InvalidAnswer("selected_option_id is required".to_string())
        })?;
        if question.option(&option_id).is_none() {
            return Err(AttemptError::InvalidOption);
        }
        return Ok(AnswerSelection::Option(option_id));
    }

    if input.selected_option_id.is_some() {
        return Err(AttemptError::InvalidAnswer(
            "Numerical questions take numerical_answer only".to_string(),
        ));
    }
    match input.numerical_value {
        Some(value) if value.is_finite() => Ok(AnswerSelection::Numerical(value)),
        Some(_) => Err(AttemptError::InvalidAnswer("numerical_answer must be finite".to_string())),
        None => Err(AttemptError::InvalidAnswer("numerical_answer is required".to_string())),
    }
}
