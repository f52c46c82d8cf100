use axum::extract::{Path, State};
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::attempt::{
    AnswerSavedResponse, AttemptQuestionResponse, AttemptResultResponse, StartAttemptResponse,
    SubmitAnswerRequest,
};
use crate::services::attempts::AnswerInput;

pub(in crate::api::attempts) async fn start_attempt(
    Path(quiz_id): Path<String>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<StartAttemptResponse>, ApiError> {
    let started = state.attempts().start_attempt(&quiz_id, &user_id).await?;
    Ok(Json(started))
}

pub(in crate::api::attempts) async fn get_question(
    Path((attempt_id, index)): Path<(String, i64)>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptQuestionResponse>, ApiError> {
    let question = state.attempts().get_question(&attempt_id, &user_id, index).await?;
    Ok(Json(question))
}

pub(in crate::api::attempts) async fn submit_answer(
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerSavedResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    let input = AnswerInput {
        selected_option_id: payload.selected_option_id,
        numerical_value: payload.numerical_answer,
    };
    let saved = state
        .attempts()
        .submit_answer(&payload.attempt_id, &user_id, &payload.question_id, input)
        .await?;

    Ok(Json(saved))
}

pub(in crate::api::attempts) async fn submit_attempt(
    Path(attempt_id): Path<String>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptResultResponse>, ApiError> {
    let result = state.attempts().submit(&attempt_id, &user_id).await?;
    Ok(Json(result))
}

pub(in crate::api::attempts) async fn get_result(
    Path(attempt_id): Path<String>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptResultResponse>, ApiError> {
    let result = state.attempts().get_result(&attempt_id, &user_id).await?;
    Ok(Json(result))
}
