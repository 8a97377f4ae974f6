use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type Registry = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// One async mutex per key (a user email or a meeting id).
///
/// Held across "read, change, write back" so two writers for the same key
/// cannot overwrite each other. Entries are dropped once nobody holds or
/// waits on them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Registry,
}

/// Exclusive access to one key until dropped
pub struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    registry: Registry,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &str) -> KeyGuard {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.to_string()).or_default().clone()
        };
        KeyGuard {
            guard: Some(lock.lock_owned().await),
            key: key.to_string(),
            registry: self.inner.clone(),
        }
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters clone the Arc under the registry lock, so a count of one
        // means only the registry still refers to it.
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}
