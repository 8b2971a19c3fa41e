//! Platform port exposing OS version and held capabilities.

use crate::error::StorageError;

/// Highest API level on which shared-storage reads need a runtime capability.
pub const STORAGE_CAPABILITY_MAX_SDK: u32 = 32;

/// Describes the running platform.
pub trait Platform: Send + Sync {
    /// The OS API level.
    fn sdk_int(&self) -> u32;

    /// Returns `true` if read access to shared storage is already held.
    fn has_storage_capability(&self) -> bool;

    /// Records that the user granted read access, so later calls skip the prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the grant cannot be recorded.
    fn remember_storage_capability(&self) -> Result<(), StorageError>;
}
