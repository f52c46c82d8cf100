use std::sync::Arc;

use crate::core::{config::Settings, time::Clock};
use crate::repositories::Store;
use crate::services::attempts::AttemptService;
use crate::services::notifier::BroadcastNotifier;
use crate::services::timer_registry::TimerRegistry;

const TIMER_CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Arc<dyn Store>,
    notifier: Arc<BroadcastNotifier>,
    timers: Arc<TimerRegistry>,
    attempts: Arc<AttemptService>,
}

impl AppState {
    /// Wires the lifecycle manager, the timer registry and the broadcast
    /// notifier around one store and one clock.
    pub(crate) fn new(settings: Settings, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let notifier = Arc::new(BroadcastNotifier::new(TIMER_CHANNEL_CAPACITY));
        let timers = Arc::new(TimerRegistry::new(clock.clone(), notifier.clone()));
        let attempts = Arc::new(AttemptService::new(store.clone(), timers.clone(), clock));

        Self { inner: Arc::new(InnerState { settings, store, notifier, timers, attempts }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub(crate) fn notifier(&self) -> &BroadcastNotifier {
        &self.inner.notifier
    }

    pub(crate) fn timers(&self) -> &TimerRegistry {
        &self.inner.timers
    }

    pub(crate) fn attempts(&self) -> &AttemptService {
        &self.inner.attempts
    }
}
