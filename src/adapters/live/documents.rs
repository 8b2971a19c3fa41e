//! Live document tree over plain directories.
//!
//! Tree references are `file://` URIs or bare paths.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::map_io;
use crate::error::StorageError;
use crate::ports::documents::{DocumentDir, DocumentFile, DocumentTree};

const FILE_SCHEME: &str = "file://";

/// Document provider that treats tree references as local directories.
pub struct LiveDocumentTree;

impl LiveDocumentTree {
    /// Creates a new live document tree.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds a tree reference for a local directory.
    #[must_use]
    pub fn tree_uri(dir: &Path) -> String {
        format!("{FILE_SCHEME}{}", dir.display())
    }
}

impl Default for LiveDocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

fn tree_path(tree: &str) -> PathBuf {
    PathBuf::from(tree.strip_prefix(FILE_SCHEME).unwrap_or(tree))
}

impl DocumentTree for LiveDocumentTree {
    fn resolve_dir(&self, tree: &str) -> Option<DocumentDir> {
        if tree.is_empty() {
            return None;
        }
        let path = tree_path(tree);
        path.is_dir().then(|| DocumentDir { uri: path.display().to_string() })
    }

    fn find_file(
        &self,
        dir: &DocumentDir,
        name: &str,
    ) -> Result<Option<DocumentFile>, StorageError> {
        let path = Path::new(&dir.uri).join(name);
        match std::fs::metadata(&path) {
            Ok(meta) => Ok(Some(DocumentFile {
                uri: path.display().to_string(),
                is_file: meta.is_file(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e)),
        }
    }

    fn create_file(
        &self,
        dir: &DocumentDir,
        mime_type: &str,
        name: &str,
    ) -> Result<Option<DocumentFile>, StorageError> {
        let path = Path::new(&dir.uri).join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!(file = %path.display(), mime_type, "created document");
                Ok(Some(DocumentFile { uri: path.display().to_string(), is_file: true }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(map_io(e)),
        }
    }

    fn read_to_string(&self, file: &DocumentFile) -> Result<String, StorageError> {
        std::fs::read_to_string(&file.uri).map_err(map_io)
    }

    fn write(&self, file: &DocumentFile, contents: &str) -> Result<(), StorageError> {
        std::fs::write(&file.uri, contents).map_err(map_io)
    }

    fn take_persistable_grant(&self, tree: &str) -> Result<(), StorageError> {
        let path = tree_path(tree);
        if path.is_dir() {
            Ok(())
        } else {
            Err(StorageError::NotFound(tree.to_string()))
        }
    }
}
