//! Key-value store trait definition.

use crate::error::StorageResult;

/// A persistent string key-value store.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently passed to `set`
/// - `remove` of a missing key is not an error
/// - A successful `set` or `remove` is durable for persistent backends
/// - Stores must be `Send + Sync` so the engine can be shared across tasks
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key` from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Returns all keys currently stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn keys(&self) -> StorageResult<Vec<String>>;
}
