//! In-memory storage medium
//!
//! `MemoryStore` is a cheap handle over a mutex-guarded map. Clones share the
//! same medium, which is how two sessions see one shared store; separately
//! constructed stores are isolated, which is how each session gets a private
//! one.

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::storage::{KeyValueStore, StorageError, Subscription};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    watchers: Vec<Sender<String>>,
    /// Maximum total bytes of keys plus values, if bounded
    quota: Option<usize>,
    unavailable: bool,
}

impl Inner {
    fn usage_with(&self, key: &str, value: &str) -> usize {
        let current: usize = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        current + key.len() + value.len()
    }

    fn notify(&mut self, key: &str) {
        // drop watchers whose subscription is gone
        self.watchers.retain(|w| w.send(key.to_string()).is_ok());
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

/// Thread-safe in-memory key-value medium
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create a new, empty, unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that refuses writes beyond `bytes` of keys plus values
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::new();
        store.lock().quota = Some(bytes);
        store
    }

    /// Make every operation fail with [`StorageError::Unavailable`]
    ///
    /// Affects all handles onto this medium. Mainly useful for testing
    /// failure handling.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a poisoned map is still a valid map
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.lock();
        inner.check_available()?;
        Ok(inner.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.check_available()?;

        if let Some(quota) = inner.quota {
            if inner.usage_with(key, value) > quota {
                warn!(key, quota, "Write rejected, quota exceeded");
                return Err(StorageError::QuotaExceeded { key: key.to_string() });
            }
        }

        inner.entries.insert(key.to_string(), value.to_string());
        inner.notify(key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.check_available()?;
        if inner.entries.remove(key).is_some() {
            inner.notify(key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let inner = self.lock();
        inner.check_available()?;
        Ok(inner.entries.keys().cloned().collect())
    }

    fn subscribe(&self) -> Result<Subscription, StorageError> {
        let mut inner = self.lock();
        inner.check_available()?;
        let (sender, subscription) = Subscription::channel();
        inner.watchers.push(sender);
        Ok(subscription)
    }
}
