//! Preferences port for process-wide persisted configuration state.

use crate::error::StorageError;

/// Persisted string key/value store.
pub trait Preferences: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store exists but cannot be read.
    fn get_string(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
