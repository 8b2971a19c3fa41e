//! Live adapters for real external interactions.
//!
//! The OS collaborators are emulated on the local filesystem: the shared
//! collection and document trees are directories, preferences are a JSON
//! file, and consent is asked on the terminal.

pub mod collection;
pub mod consent;
pub mod documents;
pub mod id_gen;
pub mod platform;
pub mod preferences;

use std::io;

use crate::error::StorageError;

/// Maps a filesystem error onto the port error taxonomy.
pub(crate) fn map_io(err: io::Error) -> StorageError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => StorageError::Security(err.to_string()),
        io::ErrorKind::NotFound => StorageError::NotFound(err.to_string()),
        _ => StorageError::Io(err),
    }
}
