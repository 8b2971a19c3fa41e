//! Consent gateway port for user-driven capability and directory grants.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Boxed future type alias used by [`ConsentGateway`] to keep the trait dyn-compatible.
pub type ConsentFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ConsentError>> + Send + 'a>>;

/// Answer to a storage-capability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityGrant {
    /// The user granted read access to shared storage.
    Granted,
    /// The user denied the request.
    Denied,
}

/// Answer to a directory-grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryGrant {
    /// The user picked a directory; carries its serialized tree reference.
    Granted(String),
    /// The user dismissed the chooser.
    Cancelled,
    /// The chooser failed.
    Error {
        /// Code to surface to the caller.
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },
}

/// Kind of consent being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentKind {
    /// Read access to the shared storage collection.
    StorageCapability,
    /// A user-chosen directory tree.
    DirectoryGrant,
}

/// Failure of the consent bridge itself, as opposed to a user decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ConsentError {
    /// A request of the same kind is already waiting for the user.
    #[error("a {0:?} request is already pending (request {1})")]
    AlreadyPending(ConsentKind, u64),

    /// The consent surface went away without answering.
    #[error("consent request {0} was abandoned by the consent surface")]
    Abandoned(u64),

    /// No consent surface is attached.
    #[error("no consent surface is available")]
    Unavailable,
}

/// Obtains user consent asynchronously.
///
/// Each request resolves exactly once. Implementations must not answer a
/// second concurrent request of the same kind by overwriting the first.
pub trait ConsentGateway: Send + Sync {
    /// Asks for read access to the shared storage collection.
    ///
    /// # Errors
    ///
    /// Returns a [`ConsentError`] if the request could not be delivered or answered.
    fn request_storage_capability(&self) -> ConsentFuture<'_, CapabilityGrant>;

    /// Asks the user to choose a directory tree.
    ///
    /// # Errors
    ///
    /// Returns a [`ConsentError`] if the request could not be delivered or answered.
    fn request_directory_grant(&self) -> ConsentFuture<'_, DirectoryGrant>;
}
