//! Document tree port for user-granted directories.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A resolved directory inside a granted tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDir {
    /// Provider-specific handle to the directory.
    pub uri: String,
}

/// A document found or created inside a [`DocumentDir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    /// Provider-specific handle to the document.
    pub uri: String,
    /// `true` for regular files, `false` for directories and other kinds.
    pub is_file: bool,
}

/// Access to documents inside a user-granted directory tree.
pub trait DocumentTree: Send + Sync {
    /// Resolves a persisted tree reference to its root directory.
    ///
    /// Returns `None` when the reference no longer names a directory.
    fn resolve_dir(&self, tree: &str) -> Option<DocumentDir>;

    /// Looks up a direct child of `dir` by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    fn find_file(&self, dir: &DocumentDir, name: &str)
        -> Result<Option<DocumentFile>, StorageError>;

    /// Creates an empty document named `name` in `dir`.
    ///
    /// Returns `None` if the provider declined to create it.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider failed while creating it.
    fn create_file(
        &self,
        dir: &DocumentDir,
        mime_type: &str,
        name: &str,
    ) -> Result<Option<DocumentFile>, StorageError>;

    /// Reads a document as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be opened or read.
    fn read_to_string(&self, file: &DocumentFile) -> Result<String, StorageError>;

    /// Replaces a document's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be opened for writing.
    fn write(&self, file: &DocumentFile, contents: &str) -> Result<(), StorageError>;

    /// Takes a durable read/write grant on the tree so it survives restarts.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider refuses the grant.
    fn take_persistable_grant(&self, tree: &str) -> Result<(), StorageError>;
}
