use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async lock per subscriber so their events are handled one at a time
/// within this process. Nothing is coordinated across processes.
#[derive(Clone, Default)]
pub struct SubscriberLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SubscriberLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry of a subscriber who left, unless someone is waiting on it.
    pub fn forget(&self, user_id: &str) {
        self.locks
            .remove_if(user_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
