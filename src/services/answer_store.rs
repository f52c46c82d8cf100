use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use crate::core::time::Clock;
use crate::repositories::{AnswerUpsert, Store};

/// A validated answer payload; exactly one representation per question type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AnswerSelection {
    Option(String),
    Numerical(f64),
}

impl AnswerSelection {
    fn columns(&self) -> (Option<&str>, Option<f64>) {
        match self {
            Self::Option(option_id) => (Some(option_id.as_str()), None),
            Self::Numerical(value) => (None, Some(*value)),
        }
    }
}

/// Idempotent answer writes: one answer per (attempt, question), overwritten in place.
#[derive(Clone)]
pub(crate) struct AnswerStore {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl AnswerStore {
    pub(crate) fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub(crate) async fn upsert(
        &self,
        attempt_id: &str,
        question_id: &str,
        selection: &AnswerSelection,
    ) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let (selected_option_id, numerical_value) = selection.columns();

        self.store
            .upsert_answer(AnswerUpsert {
                id: &id,
                attempt_id,
                question_id,
                selected_option_id,
                numerical_value,
                now: self.clock.now(),
            })
            .await?;

        metrics::counter!("answers_saved_total").increment(1);
        Ok(())
    }

    pub(crate) async fn answered_count(&self, attempt_id: &str) -> Result<i64> {
        self.store.count_answers(attempt_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, ManualClock};
    use crate::repositories::memory::MemoryStore;
    use time::Duration;

    #[tokio::test]
    async fn resubmission_overwrites_and_keeps_answered_at() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(test_support::base_time()));
        let answers = AnswerStore::new(store.clone(), clock.clone());

        answers.upsert("a1", "q1", &AnswerSelection::Numerical(4.0)).await.unwrap();
        let first_at = clock.now();
        clock.advance(Duration::seconds(42));
        answers.upsert("a1", "q1", &AnswerSelection::Numerical(5.0)).await.unwrap();
        answers.upsert("a1", "q2", &AnswerSelection::Option("o7".to_string())).await.unwrap();

        assert_eq!(answers.answered_count("a1").await.unwrap(), 2);

        let stored = store.list_answers("a1").await.unwrap();
        let q1 = stored.iter().find(|answer| answer.question_id == "q1").expect("q1 answer");
        assert_eq!(q1.numerical_value, Some(5.0));
        assert_eq!(q1.selected_option_id, None);
        assert_eq!(q1.answered_at, first_at);
        assert_eq!(q1.last_modified_at, first_at + Duration::seconds(42));
        assert_eq!(q1.points_earned, None);
    }
}
