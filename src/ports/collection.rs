//! Shared storage collection port.
//!
//! Entries in the collection are addressed by query on
//! `(relative_path, display_name)`. The handle returned by a query is only
//! valid until the next query, since the platform may relocate entries.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Opaque handle to an entry in the shared collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

/// Values for a newly inserted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Folder inside the collection, with a trailing slash.
    pub relative_path: String,
    /// File name shown to the user.
    pub display_name: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Insert in the provisional, non-visible state.
    pub pending: bool,
}

/// Splits `name.ext` into `("name", ".ext")`.
#[must_use]
pub fn split_name(display_name: &str) -> (&str, &str) {
    match display_name.rfind('.') {
        Some(dot) if dot > 0 => display_name.split_at(dot),
        _ => (display_name, ""),
    }
}

/// Name given to the `n`th colliding insert of `display_name`, e.g.
/// `device-id-provider (1).json`.
#[must_use]
pub fn suffixed_name(display_name: &str, n: u32) -> String {
    let (stem, ext) = split_name(display_name);
    format!("{stem} ({n}){ext}")
}

/// Collision index of `name` relative to `display_name`: `0` for the name
/// itself, `n` for its `" (n)"` variant, `None` for anything else.
#[must_use]
pub fn suffix_index(name: &str, display_name: &str) -> Option<u32> {
    if name == display_name {
        return Some(0);
    }
    let (stem, ext) = split_name(display_name);
    let n = name.strip_prefix(stem)?.strip_suffix(ext)?.strip_prefix(" (")?.strip_suffix(')')?;
    n.parse().ok().filter(|n| *n > 0)
}

/// Shared storage collection queried by folder and name.
pub trait SharedCollection: Send + Sync {
    /// Finds the oldest visible entry at `relative_path` named
    /// `display_name`, counting collision-suffixed names such as
    /// `name (1).ext` as matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be run.
    fn query(
        &self,
        relative_path: &str,
        display_name: &str,
    ) -> Result<Option<EntryId>, StorageError>;

    /// Finds the oldest provisional entry matching like [`Self::query`].
    ///
    /// Such an entry was inserted but never published, usually because the
    /// writer stopped between the two steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be run.
    fn find_pending(
        &self,
        relative_path: &str,
        display_name: &str,
    ) -> Result<Option<EntryId>, StorageError>;

    /// Inserts a new, empty entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the insert.
    fn insert(&self, entry: &NewEntry) -> Result<EntryId, StorageError>;

    /// Reads the entry's content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be opened or read.
    fn read_to_string(&self, id: &EntryId) -> Result<String, StorageError>;

    /// Replaces the entry's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be opened for writing.
    fn write(&self, id: &EntryId, contents: &str) -> Result<(), StorageError>;

    /// Moves the entry into or out of the provisional state.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be updated.
    fn set_pending(&self, id: &EntryId, pending: bool) -> Result<(), StorageError>;

    /// Removes the entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be removed.
    fn delete(&self, id: &EntryId) -> Result<(), StorageError>;
}
