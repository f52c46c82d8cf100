use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Answer, QuestionOption, QuestionWithOptions};
use crate::db::types::{AttemptStatus, QuestionType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct QuestionOptionView {
    pub(crate) id: String,
    pub(crate) option_text: String,
    pub(crate) order_index: i32,
}

/// A question as shown while an attempt is running: no correctness, no explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct QuestionView {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    #[serde(rename = "type")]
    pub(crate) question_type: QuestionType,
    pub(crate) question_text: String,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) options: Vec<QuestionOptionView>,
}

impl From<&QuestionWithOptions> for QuestionView {
    fn from(item: &QuestionWithOptions) -> Self {
        Self {
            id: item.question.id.clone(),
            quiz_id: item.question.quiz_id.clone(),
            question_type: item.question.question_type,
            question_text: item.question.question_text.clone(),
            points: item.question.points,
            order_index: item.question.order_index,
            options: item
                .options
                .iter()
                .map(|option| QuestionOptionView {
                    id: option.id.clone(),
                    option_text: option.option_text.clone(),
                    order_index: option.order_index,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StartAttemptResponse {
    pub(crate) attempt_id: String,
    pub(crate) quiz_id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: i32,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
    pub(crate) total_questions: i64,
    pub(crate) first_question: Option<QuestionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AttemptQuestionResponse {
    pub(crate) attempt_id: String,
    pub(crate) question_index: i64,
    pub(crate) total_questions: i64,
    pub(crate) expires_at: String,
    pub(crate) question: QuestionView,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitAnswerRequest {
    #[validate(length(min = 1, max = 64))]
    pub(crate) attempt_id: String,
    #[validate(length(min = 1, max = 64))]
    pub(crate) question_id: String,
    #[validate(length(min = 1, max = 64))]
    pub(crate) selected_option_id: Option<String>,
    pub(crate) numerical_answer: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AnswerSavedResponse {
    pub(crate) saved: bool,
    pub(crate) message: String,
    pub(crate) answered_count: i64,
    pub(crate) total_questions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ResultOptionView {
    pub(crate) id: String,
    pub(crate) option_text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

impl From<&QuestionOption> for ResultOptionView {
    fn from(option: &QuestionOption) -> Self {
        Self {
            id: option.id.clone(),
            option_text: option.option_text.clone(),
            is_correct: option.is_correct,
            order_index: option.order_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct UserAnswerView {
    pub(crate) selected_option_id: Option<String>,
    pub(crate) numerical_value: Option<f64>,
    pub(crate) answered_at: String,
    pub(crate) last_modified_at: String,
}

impl From<&Answer> for UserAnswerView {
    fn from(answer: &Answer) -> Self {
        Self {
            selected_option_id: answer.selected_option_id.clone(),
            numerical_value: answer.numerical_value,
            answered_at: format_primitive(answer.answered_at),
            last_modified_at: format_primitive(answer.last_modified_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct QuestionResultView {
    pub(crate) question_id: String,
    #[serde(rename = "type")]
    pub(crate) question_type: QuestionType,
    pub(crate) question_text: String,
    pub(crate) explanation: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) points: i32,
    pub(crate) points_earned: i32,
    pub(crate) is_correct: bool,
    pub(crate) user_answer: Option<UserAnswerView>,
    pub(crate) accepted_value: Option<f64>,
    pub(crate) options: Vec<ResultOptionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AttemptResultResponse {
    pub(crate) attempt_id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) status: AttemptStatus,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) percentage: f64,
    pub(crate) passed: bool,
    pub(crate) passing_score: i32,
    pub(crate) started_at: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) correct_answers: usize,
    pub(crate) total_questions: usize,
    pub(crate) question_results: Vec<QuestionResultView>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct ExpireAttemptsResponse {
    pub(crate) closed: usize,
    pub(crate) failed: usize,
}
