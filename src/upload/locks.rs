//! Completion Locks
//!
//! Per-identity mutual exclusion for the assembly step. Completions of the
//! same identity queue behind each other; completions of different
//! identities run in parallel.
//!
//! The registry only holds weak references. A lock lives as long as some
//! task holds or waits for it and is pruned from the map afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::identity::Identity;

type LockMap = HashMap<String, Weak<AsyncMutex<()>>>;

/// Registry of per-identity completion locks
#[derive(Debug, Clone, Default)]
pub struct CompletionLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Held for the duration of one completion
#[derive(Debug)]
pub struct CompletionGuard {
    _guard: OwnedMutexGuard<()>,
}

impl CompletionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other completion of this identity is running
    pub async fn acquire(&self, identity: &Identity) -> CompletionGuard {
        let lock = {
            let mut locks = self.inner.lock();
            locks.retain(|_, lock| lock.strong_count() > 0);

            match locks.get(identity.as_str()).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(identity.as_str().to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        CompletionGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of identities with a completion running or queued
    #[cfg(test)]
    fn active(&self) -> usize {
        self.inner
            .lock()
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn identity(name: &str) -> Identity {
        Identity::from_display_name(name).unwrap()
    }

    #[tokio::test]
    async fn test_same_identity_is_exclusive() {
        let locks = CompletionLocks::new();
        let a = identity("a.bin");

        let guard = locks.acquire(&a).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&a)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&a)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_identities_do_not_block() {
        let locks = CompletionLocks::new();

        let _a = locks.acquire(&identity("a.bin")).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&identity("b.bin"))).await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_waiters_run_one_at_a_time() {
        let locks = CompletionLocks::new();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let running = running.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire(&identity("shared.bin")).await;
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_released_locks_are_reclaimed() {
        let locks = CompletionLocks::new();

        {
            let _a = locks.acquire(&identity("a.bin")).await;
            let _b = locks.acquire(&identity("b.bin")).await;
            assert_eq!(locks.active(), 2);
        }

        assert_eq!(locks.active(), 0);
        let _c = locks.acquire(&identity("c.bin")).await;
        assert_eq!(locks.inner.lock().len(), 1);
    }
}
