use serde::Serialize;
use tokio::sync::broadcast;

/// Countdown state pushed to clients watching an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TimerUpdate {
    pub(crate) attempt_id: String,
    pub(crate) remaining_seconds: i64,
    pub(crate) server_time: String,
    pub(crate) expired: bool,
}

impl TimerUpdate {
    pub(crate) fn tick(attempt_id: &str, remaining_seconds: i64, server_time: String) -> Self {
        Self { attempt_id: attempt_id.to_string(), remaining_seconds, server_time, expired: false }
    }

    pub(crate) fn expiry(attempt_id: &str, server_time: String) -> Self {
        Self {
            attempt_id: attempt_id.to_string(),
            remaining_seconds: 0,
            server_time,
            expired: true,
        }
    }
}

/// Fire-and-forget delivery of timer updates. Implementations must not fail
/// the caller when nobody is listening.
pub(crate) trait Notifier: Send + Sync {
    fn notify(&self, update: &TimerUpdate);
}

#[derive(Clone)]
pub(crate) struct BroadcastNotifier {
    sender: broadcast::Sender<TimerUpdate>,
}

impl BroadcastNotifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<TimerUpdate> {
        self.sender.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, update: &TimerUpdate) {
        // Err only means there are no subscribers right now.
        if self.sender.send(update.clone()).is_err() {
            tracing::trace!(attempt_id = %update.attempt_id, "No timer subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_updates_and_missing_subscribers_are_ignored() {
        let notifier = BroadcastNotifier::new(8);
        notifier.notify(&TimerUpdate::tick("a0", 10, "t".to_string()));

        let mut receiver = notifier.subscribe();
        notifier.notify(&TimerUpdate::tick("a1", 42, "2025-01-01T00:00:00Z".to_string()));
        notifier.notify(&TimerUpdate::expiry("a1", "2025-01-01T00:00:42Z".to_string()));

        let tick = receiver.recv().await.expect("tick");
        assert_eq!(tick.remaining_seconds, 42);
        assert!(!tick.expired);

        let expiry = receiver.recv().await.expect("expiry");
        assert_eq!(expiry.remaining_seconds, 0);
        assert!(expiry.expired);
    }

    #[test]
    fn update_serializes_with_snake_case_fields() {
        let update = TimerUpdate::tick("a1", 5, "2025-01-01T00:00:00Z".to_string());
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["attempt_id"], "a1");
        assert_eq!(json["remaining_seconds"], 5);
        assert_eq!(json["expired"], false);
    }
}
