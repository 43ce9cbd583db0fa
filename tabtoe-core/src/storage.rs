//! Key-value repository interface
//!
//! The engine never touches a concrete storage medium. Both the medium
//! shared between sessions and the medium private to one session are
//! reached through [`KeyValueStore`], so tests can inject an in-memory fake
//! and a deployment can back it with whatever the host provides.
//!
//! All methods take `&self`: implementations are handles onto a medium
//! that may be shared with other handles.

use std::sync::mpsc::{self, Receiver, Sender};

/// Errors raised by a storage medium
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },
    #[error("Corrupted storage: {0}")]
    Corrupt(String),
}

/// String-keyed, string-valued storage medium
pub trait KeyValueStore: Send + 'static {
    /// Read a value, `Ok(None)` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key; deleting an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently present, in no particular order
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Watch for keys changed through any handle onto this medium
    ///
    /// Media that cannot observe foreign writes return
    /// [`Subscription::inert`].
    fn subscribe(&self) -> Result<Subscription, StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }

    fn subscribe(&self) -> Result<Subscription, StorageError> {
        (**self).subscribe()
    }
}

/// Stream of changed keys
///
/// Draining is non-blocking; keys changed since the last drain are returned
/// in the order they were written.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<String>,
}

impl Subscription {
    /// Create a subscription and the sender that feeds it
    pub fn channel() -> (Sender<String>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { receiver })
    }

    /// A subscription that never yields anything
    pub fn inert() -> Self {
        let (_, subscription) = Self::channel();
        subscription
    }

    /// Collect every change notification received so far
    pub fn drain(&self) -> Vec<String> {
        self.receiver.try_iter().collect()
    }
}
