//! Expiry deadlines for in-progress attempts.
//!
//! The registry is only a scheduling aid. Removing an entry never guarantees
//! that an expiry in flight is stopped; the attempt's status guard in the
//! lifecycle manager is what keeps finalization exactly-once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::core::time::{format_primitive, seconds_until, Clock};
use crate::services::notifier::{Notifier, TimerUpdate};

/// Receives attempts whose deadline has passed.
#[async_trait]
pub(crate) trait ExpiryHandler: Send + Sync {
    async fn auto_submit(&self, attempt_id: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SweepReport {
    pub(crate) ticked: usize,
    pub(crate) expired: usize,
    pub(crate) failed: usize,
}

pub(crate) struct TimerRegistry {
    deadlines: Mutex<HashMap<String, PrimitiveDateTime>>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl TimerRegistry {
    pub(crate) fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self { deadlines: Mutex::new(HashMap::new()), clock, notifier }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PrimitiveDateTime>> {
        self.deadlines.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Timer registry mutex poisoned; recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn register(&self, attempt_id: &str, expires_at: PrimitiveDateTime) {
        let mut deadlines = self.lock();
        deadlines.insert(attempt_id.to_string(), expires_at);
        metrics::gauge!("active_timers").set(deadlines.len() as f64);
        tracing::debug!(attempt_id, expires_at = %format_primitive(expires_at), "Timer registered");
    }

    /// Returns whether an entry was removed.
    pub(crate) fn cancel(&self, attempt_id: &str) -> bool {
        let mut deadlines = self.lock();
        let removed = deadlines.remove(attempt_id).is_some();
        metrics::gauge!("active_timers").set(deadlines.len() as f64);
        removed
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, attempt_id: &str) -> bool {
        self.lock().contains_key(attempt_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// One pass over every registered deadline: ticks for live attempts,
    /// expiry plus auto-submit for the rest. Expired entries are taken out of
    /// the map before anything else happens, so a deadline fires once.
    pub(crate) async fn sweep(&self, handler: &dyn ExpiryHandler) -> SweepReport {
        let now = self.clock.now();
        let server_time = format_primitive(now);

        let mut ticks = Vec::new();
        let mut expired = Vec::new();
        {
            let mut deadlines = self.lock();
            deadlines.retain(|attempt_id, expires_at| {
                let remaining = seconds_until(now, *expires_at);
                if remaining > 0 {
                    ticks.push((attempt_id.clone(), remaining));
                    true
                } else {
                    expired.push(attempt_id.clone());
                    false
                }
            });
            metrics::gauge!("active_timers").set(deadlines.len() as f64);
        }

        for (attempt_id, remaining) in &ticks {
            self.notifier.notify(&TimerUpdate::tick(attempt_id, *remaining, server_time.clone()));
        }

        let mut report = SweepReport { ticked: ticks.len(), ..SweepReport::default() };
        for attempt_id in &expired {
            self.notifier.notify(&TimerUpdate::expiry(attempt_id, server_time.clone()));
            metrics::counter!("timer_expirations_total").increment(1);
            report.expired += 1;

            if let Err(err) = handler.auto_submit(attempt_id).await {
                report.failed += 1;
                metrics::counter!("expiry_failures_total").increment(1);
                tracing::error!(attempt_id, error = %err, "Failed to auto-submit expired attempt");
            }
        }

        if report.expired > 0 {
            tracing::info!(
                expired = report.expired,
                failed = report.failed,
                remaining = ticks.len(),
                "Timer sweep expired attempts"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, ManualClock, RecordingNotifier};
    use time::Duration;

    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl ExpiryHandler for RecordingHandler {
        async fn auto_submit(&self, attempt_id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(attempt_id.to_string());
            if self.failing.iter().any(|id| id == attempt_id) {
                anyhow::bail!("store unavailable");
            }
            Ok(())
        }
    }

    fn registry() -> (TimerRegistry, Arc<ManualClock>, Arc<RecordingNotifier>) {
        let clock = Arc::new(ManualClock::new(test_support::base_time()));
        let notifier = Arc::new(RecordingNotifier::default());
        (TimerRegistry::new(clock.clone(), notifier.clone()), clock, notifier)
    }

    #[tokio::test]
    async fn sweep_ticks_live_attempts_and_fires_expired_once() {
        let (registry, clock, notifier) = registry();
        let now = clock.now();
        registry.register("live", now + Duration::seconds(90));
        registry.register("due", now + Duration::seconds(1));
        let handler = RecordingHandler::default();

        let report = registry.sweep(&handler).await;
        assert_eq!(report, SweepReport { ticked: 2, expired: 0, failed: 0 });
        assert!(handler.calls.lock().unwrap().is_empty());

        clock.advance(Duration::milliseconds(1500));
        let report = registry.sweep(&handler).await;
        assert_eq!(report, SweepReport { ticked: 1, expired: 1, failed: 0 });
        assert!(!registry.contains("due"));
        assert_eq!(registry.len(), 1);

        let report = registry.sweep(&handler).await;
        assert_eq!(report.expired, 0);
        assert_eq!(*handler.calls.lock().unwrap(), vec!["due".to_string()]);

        let updates = notifier.updates();
        let expiry: Vec<_> = updates.iter().filter(|update| update.expired).collect();
        assert_eq!(expiry.len(), 1);
        assert_eq!(expiry[0].attempt_id, "due");
        assert_eq!(expiry[0].remaining_seconds, 0);
        assert!(updates.iter().filter(|u| !u.expired).all(|u| u.remaining_seconds > 0));
    }

    #[tokio::test]
    async fn cancelled_attempt_never_fires() {
        let (registry, clock, notifier) = registry();
        registry.register("a1", clock.now() + Duration::seconds(5));
        assert!(registry.cancel("a1"));
        assert!(!registry.cancel("a1"));

        clock.advance(Duration::seconds(10));
        let handler = RecordingHandler::default();
        let report = registry.sweep(&handler).await;

        assert_eq!(report, SweepReport::default());
        assert!(notifier.updates().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_does_not_stop_the_sweep() {
        let (registry, clock, _notifier) = registry();
        let now = clock.now();
        registry.register("a1", now);
        registry.register("a2", now - Duration::seconds(3));
        registry.register("a3", now);
        let handler = RecordingHandler { failing: vec!["a2".to_string()], ..Default::default() };

        let report = registry.sweep(&handler).await;

        assert_eq!(report, SweepReport { ticked: 0, expired: 3, failed: 1 });
        assert_eq!(handler.calls.lock().unwrap().len(), 3);
        assert_eq!(registry.len(), 0);
    }
}
