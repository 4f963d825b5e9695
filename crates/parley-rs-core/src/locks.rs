//! Per-key mutual exclusion.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Lock table keyed by string, e.g. one entry per channel or per user.
///
/// Holders of different keys never wait on each other. Entries are dropped
/// once no guard or waiter references them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    table: LockTable,
    disabled: bool,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose guards never block.
    pub fn disabled() -> Self {
        Self {
            table: LockTable::default(),
            disabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyedGuard {
        if self.disabled {
            return KeyedGuard {
                key: key.to_string(),
                table: self.table.clone(),
                guard: None,
            };
        }
        let entry = {
            let mut table = self.table.lock();
            table.entry(key.to_string()).or_default().clone()
        };
        let guard = entry.lock_owned().await;
        KeyedGuard {
            key: key.to_string(),
            table: self.table.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.table.lock().len()
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyedGuard {
    key: String,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        drop(guard);
        let mut table = self.table.lock();
        let unused = table
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1);
        if unused {
            table.remove(&self.key);
        }
    }
}
