use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::state::AppState;

/// Background loops driving attempt expiry. Started once on boot and
/// stopped through [`SchedulerHandle::shutdown`].
pub(crate) struct Scheduler;

pub(crate) struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub(crate) fn start(state: AppState) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handles = vec![
            tokio::spawn(timer_sweep_loop(state.clone(), shutdown_rx.clone())),
            tokio::spawn(expiry_catchup_loop(state, shutdown_rx)),
        ];

        SchedulerHandle { shutdown_tx, handles }
    }
}

impl SchedulerHandle {
    pub(crate) async fn shutdown(self) {
        if self.shutdown_tx.send(true).is_err() {
            tracing::warn!("Failed to broadcast shutdown signal to background tasks");
        }

        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Background task join failed");
            }
        }
    }
}

async fn timer_sweep_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(state.settings().timer().sync_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                state.timers().sweep(state.attempts()).await;
            }
        }
    }
}

async fn expiry_catchup_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(state.settings().timer().catchup_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = state.attempts().process_expired_attempts().await {
                    tracing::error!(error = %err, "process_expired_attempts failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, QUIZ_ID};
    use time::Duration;

    #[tokio::test]
    async fn scheduler_expires_attempts_and_stops_on_shutdown() {
        let ctx = test_support::setup_test_context().await;
        let started = ctx.state.attempts().start_attempt(QUIZ_ID, "u1").await.unwrap();
        ctx.clock.advance(Duration::minutes(31));

        let handle = Scheduler::start(ctx.state.clone());
        let mut status = None;
        for _ in 0..50 {
            let attempt =
                ctx.state.store().find_attempt(&started.attempt_id).await.unwrap().unwrap();
            if attempt.status.is_terminal() {
                status = Some(attempt.status);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        handle.shutdown().await;

        assert_eq!(status, Some(crate::db::types::AttemptStatus::AutoSubmitted));
        assert_eq!(ctx.state.timers().len(), 0);
    }
}
