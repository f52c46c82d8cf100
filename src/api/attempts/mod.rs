mod handlers;
mod timer;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/start/:quiz_id", post(handlers::start_attempt))
        .route("/answer", post(handlers::submit_answer))
        .route("/:attempt_id/questions/:index", get(handlers::get_question))
        .route("/:attempt_id/submit", post(handlers::submit_attempt))
        .route("/:attempt_id/result", get(handlers::get_result))
        .route("/:attempt_id/timer", get(timer::stream_timer))
}
