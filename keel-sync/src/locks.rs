//! Keyed lock table.
//!
//! One async mutex per key, created on first use and dropped once nobody
//! holds or waits on it. Holders of different keys never block each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

/// Table of per-key mutual exclusion locks.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    slots: Arc<DashMap<String, Slot>>,
}

impl KeyedLocks {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    ///
    /// Access is released when the returned guard drops, on every exit path.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        // Declared before the wait so a cancelled waiter still releases its slot.
        let mut waiter = Waiter {
            key: key.to_string(),
            slots: Some(Arc::clone(&self.slots)),
        };
        let slot = Arc::clone(self.slots.entry(key.to_string()).or_default().value());
        let guard = slot.lock_owned().await;

        KeyGuard {
            key: std::mem::take(&mut waiter.key),
            guard: Some(guard),
            slots: waiter.slots.take().unwrap_or_else(|| Arc::clone(&self.slots)),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no key is held or waited on.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Exclusive access to one key of a [`KeyedLocks`] table.
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Arc<DashMap<String, Slot>>,
}

impl KeyGuard {
    /// The key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first so our own Arc no longer counts.
        drop(self.guard.take());
        release_slot(&self.slots, &self.key);
    }
}

/// A `lock` call that has not acquired yet.
struct Waiter {
    key: String,
    slots: Option<Arc<DashMap<String, Slot>>>,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.take() {
            release_slot(&slots, &self.key);
        }
    }
}

/// Removes the slot when only the table still references it.
fn release_slot(slots: &DashMap<String, Slot>, key: &str) {
    slots.remove_if(key, |_, slot| Arc::strong_count(slot) == 1);
}
