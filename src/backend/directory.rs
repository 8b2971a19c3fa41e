//! User-directory backend.
//!
//! The record lives in a directory the user picked once. The tree reference
//! is kept in preferences under [`TREE_URI_KEY`] so later calls go straight
//! to the file.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    blocking, BackendFuture, BackendKind, PeekOutcome, StorageBackend, RECORD_MIME_TYPE,
};
use crate::codec::{self, DeviceId};
use crate::error::{ProvisionError, StorageError};
use crate::ports::{ConsentGateway, DirectoryGrant, DocumentTree, IdGenerator, Preferences};

/// Preferences key holding the granted tree reference.
pub const TREE_URI_KEY: &str = "treeUri";

/// Backend storing the record inside a user-granted directory tree.
pub struct UserDirectoryBackend {
    consent: Arc<dyn ConsentGateway>,
    documents: Arc<dyn DocumentTree>,
    prefs: Arc<dyn Preferences>,
    id_gen: Arc<dyn IdGenerator>,
    file_name: String,
}

impl UserDirectoryBackend {
    /// Creates a backend over the given ports.
    pub fn new(
        consent: Arc<dyn ConsentGateway>,
        documents: Arc<dyn DocumentTree>,
        prefs: Arc<dyn Preferences>,
        id_gen: Arc<dyn IdGenerator>,
        file_name: impl Into<String>,
    ) -> Self {
        Self { consent, documents, prefs, id_gen, file_name: file_name.into() }
    }

    async fn tree(&self) -> Result<String, ProvisionError> {
        let prefs = Arc::clone(&self.prefs);
        let stored = blocking(move || {
            prefs
                .get_string(TREE_URI_KEY)
                .map_err(|e| ProvisionError::Io(format!("failed to read preferences: {e}")))
        })
        .await?;
        if let Some(tree) = stored {
            return Ok(tree);
        }

        let tree = match self.consent.request_directory_grant().await {
            Ok(DirectoryGrant::Granted(tree)) => tree,
            Ok(DirectoryGrant::Cancelled) => {
                return Err(ProvisionError::Cancel("User cancelled".into()))
            }
            Ok(DirectoryGrant::Error { code, message }) => {
                return Err(ProvisionError::new(code, message))
            }
            Err(err) => return Err(ProvisionError::Saf(err.to_string())),
        };

        let documents = Arc::clone(&self.documents);
        let prefs = Arc::clone(&self.prefs);
        blocking(move || persist_tree(documents.as_ref(), prefs.as_ref(), tree)).await
    }
}

fn persist_tree(
    documents: &dyn DocumentTree,
    prefs: &dyn Preferences,
    tree: String,
) -> Result<String, ProvisionError> {
    if let Err(err) = documents.take_persistable_grant(&tree) {
        warn!(tree = %tree, error = %err, "could not take persistable grant");
    }
    prefs.put_string(TREE_URI_KEY, &tree)?;
    info!(tree = %tree, "directory tree granted");
    Ok(tree)
}

fn peek_in_tree(
    documents: &dyn DocumentTree,
    prefs: &dyn Preferences,
    file_name: &str,
) -> PeekOutcome {
    let tree = match prefs.get_string(TREE_URI_KEY) {
        Ok(Some(tree)) => tree,
        Ok(None) => return PeekOutcome::Absent,
        Err(err) => return PeekOutcome::Unreadable(err),
    };
    let Some(dir) = documents.resolve_dir(&tree) else {
        debug!(tree = %tree, "granted tree no longer resolves");
        return PeekOutcome::Absent;
    };
    let file = match documents.find_file(&dir, file_name) {
        Ok(Some(file)) if file.is_file => file,
        Ok(_) => return PeekOutcome::Absent,
        Err(err) => return PeekOutcome::Unreadable(err),
    };
    match documents.read_to_string(&file) {
        Ok(text) => codec::decode_lines(&text).map_or(PeekOutcome::Corrupt, PeekOutcome::Found),
        Err(err) => PeekOutcome::Unreadable(err),
    }
}

fn provision_in_tree(
    documents: &dyn DocumentTree,
    id_gen: &dyn IdGenerator,
    tree: &str,
    file_name: &str,
) -> Result<DeviceId, ProvisionError> {
    let dir = documents
        .resolve_dir(tree)
        .ok_or_else(|| ProvisionError::Saf("Invalid tree uri".into()))?;

    let file = match documents.find_file(&dir, file_name)? {
        Some(file) => {
            if file.is_file {
                match documents.read_to_string(&file) {
                    Ok(text) => match codec::decode_lines(&text) {
                        Some(id) => {
                            debug!(%id, "found existing directory record");
                            return Ok(id);
                        }
                        None => warn!(
                            file = %file.uri,
                            bytes = text.len(),
                            "overwriting corrupt directory record"
                        ),
                    },
                    Err(StorageError::Security(msg)) => {
                        return Err(ProvisionError::Permission(msg))
                    }
                    Err(err) => {
                        warn!(file = %file.uri, error = %err, "record unreadable; overwriting");
                    }
                }
            }
            file
        }
        None => documents
            .create_file(&dir, RECORD_MIME_TYPE, file_name)?
            .ok_or_else(|| ProvisionError::Saf("Failed to create file".into()))?,
    };

    let id = id_gen.generate_id();
    documents.write(&file, &codec::encode(&id))?;
    info!(%id, file = %file.uri, "wrote directory record");
    Ok(id)
}

impl StorageBackend for UserDirectoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::UserDirectory
    }

    fn peek_outcome(&self) -> PeekOutcome {
        peek_in_tree(self.documents.as_ref(), self.prefs.as_ref(), &self.file_name)
    }

    fn get_or_create(&self) -> BackendFuture<'_> {
        Box::pin(async move {
            let tree = self.tree().await?;

            let documents = Arc::clone(&self.documents);
            let id_gen = Arc::clone(&self.id_gen);
            let file_name = self.file_name.clone();
            blocking(move || {
                provision_in_tree(documents.as_ref(), id_gen.as_ref(), &tree, &file_name)
            })
            .await
        })
    }
}
