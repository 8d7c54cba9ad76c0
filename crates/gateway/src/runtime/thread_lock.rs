//! Per-thread concurrency control.
//!
//! Only one turn runs per thread at a time. A second message arriving while
//! a turn is in flight waits for the first to finish.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Each thread id maps to a `Semaphore(1)`; holding the permit is holding
/// the thread.
pub struct ThreadLockMap {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Default for ThreadLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadLockMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `thread_id`. The permit releases on drop.
    pub async fn acquire(&self, thread_id: &str) -> Result<OwnedSemaphorePermit, ThreadLockClosed> {
        let sem = {
            let mut locks = self.locks.lock();
            locks
                .entry(thread_id.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };
        if let Ok(permit) = sem.clone().try_acquire_owned() {
            return Ok(permit);
        }
        tracing::debug!(thread_id, "turn in flight, queueing");
        sem.acquire_owned().await.map_err(|_| ThreadLockClosed)
    }

    /// Number of tracked threads.
    pub fn thread_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Forget locks nobody holds or is about to take.
    pub fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock();
        let before = locks.len();
        // A held permit or a queued `acquire` keeps its own Arc clone.
        locks.retain(|_, sem| Arc::strong_count(sem) > 1);
        before - locks.len()
    }
}

#[derive(Debug)]
pub struct ThreadLockClosed;

impl std::fmt::Display for ThreadLockClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "thread lock closed")
    }
}

impl std::error::Error for ThreadLockClosed {}
