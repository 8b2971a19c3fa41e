//! Storage backends implementing peek / get-or-create.
//!
//! Two variants exist: [`shared::SharedStorageBackend`] for older platforms
//! and [`directory::UserDirectoryBackend`] for newer ones. Which one applies
//! is decided once, by [`backend_kind_for`].

pub mod directory;
pub mod shared;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::codec::DeviceId;
use crate::error::{ProvisionError, StorageError};

pub use directory::UserDirectoryBackend;
pub use shared::SharedStorageBackend;

/// Lowest API level served by the user-directory backend.
pub const USER_DIRECTORY_MIN_SDK: u32 = 33;

/// Record file name used by both backends.
pub const RECORD_FILE_NAME: &str = "device-id-provider.json";

/// MIME type of the record file.
pub const RECORD_MIME_TYPE: &str = "application/json";

/// Boxed future returned by [`StorageBackend::get_or_create`].
pub type BackendFuture<'a> =
    Pin<Box<dyn Future<Output = Result<DeviceId, ProvisionError>> + Send + 'a>>;

/// Which storage strategy a platform uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Well-known entry in the shared storage collection.
    SharedStorage,
    /// File inside a user-granted directory tree.
    UserDirectory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SharedStorage => "shared-storage",
            Self::UserDirectory => "user-directory",
        })
    }
}

/// Maps a platform API level to the backend that serves it.
#[must_use]
pub fn backend_kind_for(sdk_int: u32) -> BackendKind {
    if sdk_int >= USER_DIRECTORY_MIN_SDK {
        BackendKind::UserDirectory
    } else {
        BackendKind::SharedStorage
    }
}

/// Result of a best-effort record lookup.
#[derive(Debug)]
pub enum PeekOutcome {
    /// A readable record was found.
    Found(DeviceId),
    /// No record exists.
    Absent,
    /// A record exists but does not contain an identifier.
    Corrupt,
    /// The lookup itself failed.
    Unreadable(StorageError),
}

impl PeekOutcome {
    /// Collapses the outcome to the public probe contract, logging what was
    /// swallowed.
    #[must_use]
    pub fn into_option(self) -> Option<DeviceId> {
        match self {
            Self::Found(id) => Some(id),
            Self::Absent => None,
            Self::Corrupt => {
                debug!("record present but corrupt; reporting absent");
                None
            }
            Self::Unreadable(err) => {
                warn!(error = %err, "record lookup failed; reporting absent");
                None
            }
        }
    }
}

/// A place the device identifier can be persisted.
pub trait StorageBackend: Send + Sync {
    /// Which strategy this backend implements.
    fn kind(&self) -> BackendKind;

    /// Looks for an existing record without prompting or writing.
    fn peek_outcome(&self) -> PeekOutcome;

    /// Looks for an existing record; every failure reads as absent.
    fn peek(&self) -> Option<DeviceId> {
        self.peek_outcome().into_option()
    }

    /// Returns the stored identifier, creating the record if needed.
    ///
    /// May ask for consent first.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionError`] carrying the callback code on failure.
    fn get_or_create(&self) -> BackendFuture<'_>;
}

/// Runs blocking storage work off the async task.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ProvisionError>
where
    F: FnOnce() -> Result<T, ProvisionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ProvisionError::Io(format!("storage task failed: {e}")))?
}
