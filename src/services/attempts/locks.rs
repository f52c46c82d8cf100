use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::RwLock;

/// One async read/write lock per attempt id.
///
/// Reads (answers, question views) share the lock; finalization takes it
/// exclusively, so no answer lands after grading has read the answer set.
#[derive(Default)]
pub(crate) struct AttemptLocks {
    entries: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl AttemptLocks {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<RwLock<()>>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn handle(&self, attempt_id: &str) -> Arc<RwLock<()>> {
        self.entries().entry(attempt_id.to_string()).or_default().clone()
    }

    /// Drops the entry for an attempt that has reached a terminal status.
    /// Holders of the old handle keep working; they re-check status anyway.
    pub(crate) fn forget(&self, attempt_id: &str) {
        self.entries().remove(attempt_id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }
}
