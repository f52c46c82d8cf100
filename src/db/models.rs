use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AttemptStatus, QuestionType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) published: bool,
    pub(crate) passing_score: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

impl Quiz {
    /// Attempts may only be started on a published quiz strictly inside its window.
    pub(crate) fn accepts_attempts_at(&self, now: PrimitiveDateTime) -> bool {
        self.published && now > self.start_time && now < self.end_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) question_text: String,
    pub(crate) explanation: Option<String>,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) option_text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

/// A question together with its options, ordered by `order_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuestionWithOptions {
    #[serde(flatten)]
    pub(crate) question: Question,
    pub(crate) options: Vec<QuestionOption>,
}

impl QuestionWithOptions {
    pub(crate) fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Attempt {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) quiz_id: String,
    pub(crate) status: AttemptStatus,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) score: Option<i32>,
    pub(crate) total_points: Option<i32>,
    pub(crate) current_question_index: i32,
}

impl Attempt {
    pub(crate) fn is_expired_at(&self, now: PrimitiveDateTime) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: String,
    pub(crate) attempt_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) numerical_value: Option<f64>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_earned: Option<i32>,
    pub(crate) answered_at: PrimitiveDateTime,
    pub(crate) last_modified_at: PrimitiveDateTime,
}
