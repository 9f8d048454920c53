//! # Keyed Locks
//!
//! One async mutex per key (product id, order id), created on first use.
//!
//! ```text
//!   task A: lock_all(["p2", "p1"])  ──► sorted ──► p1 ──► p2
//!   task B: lock_all(["p1", "p3"])  ──► sorted ──► p1 (waits) ──► p3
//!
//!   Every caller takes keys in ascending order, so no cycle can form.
//! ```
//!
//! Callers take these locks before borrowing a pooled connection and
//! never the other way round.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry size above which idle entries are pruned.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Guards for a set of keys. Dropping it unlocks all of them.
#[derive(Debug)]
pub struct KeyGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        KeyedLocks::default()
    }

    /// Locks a single key.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        self.lock_all([key]).await
    }

    /// Locks every key, in ascending order, skipping duplicates.
    pub async fn lock_all<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> KeyGuard {
        let mut keys: Vec<&str> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let mutex = self.entry(key);
            guards.push(mutex.lock_owned().await);
        }
        KeyGuard { _guards: guards }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.map();
        if map.len() > PRUNE_THRESHOLD {
            // Only the registry holds an idle entry.
            map.retain(|_, m| Arc::strong_count(m) > 1);
        }
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _g = locks.lock("p-1").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overlapping_sets_do_not_deadlock() {
        let locks = Arc::new(KeyedLocks::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let keys = if i % 2 == 0 { ["a", "b"] } else { ["b", "a"] };
                let _g = locks.lock_all(keys).await;
                tokio::task::yield_now().await;
            }));
        }

        let all = async {
            for h in handles {
                h.await.unwrap();
            }
        };
        tokio::time::timeout(Duration::from_secs(5), all)
            .await
            .expect("lock_all deadlocked");
    }

    #[tokio::test]
    async fn test_duplicate_keys_lock_once() {
        let locks = KeyedLocks::new();
        let _g = locks.lock_all(["x", "x", "y"]).await;
        assert_eq!(locks.len(), 2);
    }
}
