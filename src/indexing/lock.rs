//! Per-document mutual exclusion.
//!
//! Re-indexing a document and every query that reads it take the same
//! [`UriLocks`] entry, so a reader never observes a document between its old
//! and new rows. Waiters are served in FIFO order (tokio's mutex is fair)
//! and documents never block each other.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct UriLocks {
    locks: Arc<LockMap>,
}

/// Held lock for one uri, released on drop.
#[derive(Debug)]
pub struct UriGuard {
    uri: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl UriLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, uri: &str) -> UriGuard {
        let mutex = Arc::clone(&self.locks.entry(uri.to_string()).or_default());
        let guard = mutex.lock_owned().await;
        UriGuard {
            uri: uri.to_string(),
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Uris with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for UriGuard {
    fn drop(&mut self) {
        // Releasing first drops the guard's handle on the mutex; only the
        // map's handle remains unless someone else holds or awaits it.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.uri, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
