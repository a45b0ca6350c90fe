//! Key-partitioned mutual exclusion.
//!
//! Read-modify-write sequences in the projectors (read previous amount, then
//! overwrite; read sibling installments, then write status) are serialized per
//! key so concurrent publishes for the same month or parent cannot lose updates.
//! Different keys never contend.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// Not re-entrant: calling `with_lock` for the same key from inside `f`
    /// deadlocks. The guarded data lives in the stores, so a poisoned slot is
    /// simply reused.
    pub fn with_lock<R>(&self, key: K, f: impl FnOnce() -> R) -> R {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let release = SlotRelease {
            slots: &self.slots,
            key,
            slot,
        };
        let _guard = release.slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of keys currently locked or awaited.
    pub fn active_keys(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Drops the slot once nobody else holds or waits on it, including when the
/// guarded closure unwinds.
struct SlotRelease<'a, K: Eq + Hash> {
    slots: &'a Mutex<HashMap<K, Arc<Mutex<()>>>>,
    key: K,
    slot: Arc<Mutex<()>>,
}

impl<K: Eq + Hash> Drop for SlotRelease<'_, K> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    #[test]
    fn serializes_read_modify_write_per_key() {
        let locks = Arc::new(KeyedLocks::<&'static str>::new());
        let value = Arc::new(AtomicU64::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let value = value.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        locks.with_lock("2024-05", || {
                            // Deliberately split read and write.
                            let current = value.load(Ordering::SeqCst);
                            thread::yield_now();
                            value.store(current + 1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(value.load(Ordering::SeqCst), 1_600);
        assert_eq!(locks.active_keys(), 0);
    }

    #[test]
    fn panicking_closure_releases_its_slot() {
        let locks = KeyedLocks::<u32>::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            locks.with_lock(7, || -> u32 { panic!("projector blew up") });
        }));

        assert!(outcome.is_err());
        assert_eq!(locks.active_keys(), 0);
        assert_eq!(locks.with_lock(7, || "reusable"), "reusable");
    }

    #[test]
    fn returns_the_closure_result() {
        let locks = KeyedLocks::<u32>::new();
        assert_eq!(locks.with_lock(1, || 41 + 1), 42);
    }
}
