use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::services::attempts::AttemptError;

/// Server-sent countdown for one attempt. The stream ends after the expiry event.
pub(in crate::api::attempts) async fn stream_timer(
    Path(attempt_id): Path<String>,
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let attempt = state.attempts().load_owned(&attempt_id, &user_id).await?;
    if attempt.status.is_terminal() {
        return Err(AttemptError::NotInProgress.into());
    }

    let receiver = state.notifier().subscribe();
    let events = stream::unfold(Some((receiver, attempt.id)), |cursor| async move {
        let (mut receiver, attempt_id) = cursor?;
        loop {
            match receiver.recv().await {
                Ok(update) if update.attempt_id == attempt_id => {
                    let name = if update.expired { "expired" } else { "tick" };
                    match Event::default().event(name).json_data(&update) {
                        Ok(event) => {
                            let next = (!update.expired).then_some((receiver, attempt_id));
                            return Some((Ok(event), next));
                        }
                        Err(err) => {
                            tracing::warn!(
                                attempt_id = %attempt_id,
                                error = %err,
                                "Failed to encode timer event"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(attempt_id = %attempt_id, skipped, "Timer stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
