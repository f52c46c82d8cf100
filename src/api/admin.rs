use axum::{extract::State, routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::AdminAccess;
use crate::core::state::AppState;
use crate::schemas::attempt::ExpireAttemptsResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/attempts/expire", post(expire_attempts))
}

/// Runs the catch-up sweep on demand, independent of the timer registry.
async fn expire_attempts(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<ExpireAttemptsResponse>, ApiError> {
    let report = state.attempts().process_expired_attempts().await?;
    tracing::info!(closed = report.closed, failed = report.failed, "Manual expiry sweep finished");
    Ok(Json(report))
}
