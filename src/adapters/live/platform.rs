//! Live platform adapter with a configured API level.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use super::map_io;
use crate::error::StorageError;
use crate::ports::platform::{Platform, STORAGE_CAPABILITY_MAX_SDK};

/// Platform whose API level comes from configuration.
///
/// A storage grant is remembered in memory and, when a marker path is set,
/// as a marker file so it survives process restarts.
pub struct LivePlatform {
    sdk_int: u32,
    granted: AtomicBool,
    marker: Option<PathBuf>,
}

impl LivePlatform {
    /// Creates a platform reporting `sdk_int`, optionally with the storage
    /// capability already held.
    #[must_use]
    pub fn new(sdk_int: u32, storage_granted: bool) -> Self {
        Self { sdk_int, granted: AtomicBool::new(storage_granted), marker: None }
    }

    /// Persists remembered grants to `path`.
    #[must_use]
    pub fn with_marker(mut self, path: impl Into<PathBuf>) -> Self {
        self.marker = Some(path.into());
        self
    }
}

impl Platform for LivePlatform {
    fn sdk_int(&self) -> u32 {
        self.sdk_int
    }

    fn has_storage_capability(&self) -> bool {
        if self.sdk_int > STORAGE_CAPABILITY_MAX_SDK {
            return true;
        }
        self.granted.load(Ordering::Acquire) || self.marker.as_ref().is_some_and(|m| m.is_file())
    }

    fn remember_storage_capability(&self) -> Result<(), StorageError> {
        self.granted.store(true, Ordering::Release);
        if let Some(marker) = &self.marker {
            if let Some(parent) = marker.parent() {
                std::fs::create_dir_all(parent).map_err(map_io)?;
            }
            std::fs::write(marker, "granted\n").map_err(map_io)?;
        }
        Ok(())
    }
}
