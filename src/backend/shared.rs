//! Shared-storage backend.
//!
//! The record is a single entry in the shared collection, found by
//! `(relative_path, display_name)` on every call because the platform may
//! move entries between calls.

use std::ops::RangeInclusive;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    blocking, BackendFuture, BackendKind, PeekOutcome, StorageBackend, RECORD_FILE_NAME,
    RECORD_MIME_TYPE,
};
use crate::codec::{self, DeviceId};
use crate::error::{ProvisionError, StorageError};
use crate::ports::{
    CapabilityGrant, ConsentGateway, EntryId, IdGenerator, NewEntry, Platform, SharedCollection,
};

/// Default folder of the record inside the shared collection.
pub const DEFAULT_RELATIVE_PATH: &str = "Download/Device-ID-Provider/";

/// API levels on which new entries start out provisional and must be
/// published explicitly.
pub const PENDING_SDK_RANGE: RangeInclusive<u32> = 29..=30;

/// Where the record lives inside the shared collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLocation {
    /// Folder path with trailing slash.
    pub relative_path: String,
    /// Entry name.
    pub display_name: String,
}

impl SharedLocation {
    /// Location inside `Download/<app_folder>/`.
    #[must_use]
    pub fn for_app(app_folder: &str) -> Self {
        Self {
            relative_path: format!("Download/{app_folder}/"),
            display_name: RECORD_FILE_NAME.to_string(),
        }
    }
}

impl Default for SharedLocation {
    fn default() -> Self {
        Self {
            relative_path: DEFAULT_RELATIVE_PATH.to_string(),
            display_name: RECORD_FILE_NAME.to_string(),
        }
    }
}

/// Backend storing the record in the shared storage collection.
pub struct SharedStorageBackend {
    platform: Arc<dyn Platform>,
    consent: Arc<dyn ConsentGateway>,
    collection: Arc<dyn SharedCollection>,
    id_gen: Arc<dyn IdGenerator>,
    location: SharedLocation,
}

impl SharedStorageBackend {
    /// Creates a backend over the given ports.
    pub fn new(
        platform: Arc<dyn Platform>,
        consent: Arc<dyn ConsentGateway>,
        collection: Arc<dyn SharedCollection>,
        id_gen: Arc<dyn IdGenerator>,
        location: SharedLocation,
    ) -> Self {
        Self { platform, consent, collection, id_gen, location }
    }

    async fn ensure_capability(&self) -> Result<(), ProvisionError> {
        if self.platform.has_storage_capability() {
            return Ok(());
        }
        match self.consent.request_storage_capability().await {
            Ok(CapabilityGrant::Granted) => {
                if let Err(err) = self.platform.remember_storage_capability() {
                    warn!(error = %err, "could not remember storage grant");
                }
                Ok(())
            }
            Ok(CapabilityGrant::Denied) => {
                Err(ProvisionError::Permission("READ_EXTERNAL_STORAGE denied".into()))
            }
            Err(err) => Err(ProvisionError::Permission(err.to_string())),
        }
    }
}

/// A located entry and what it decoded to.
enum Lookup {
    Missing,
    Found(EntryId, DeviceId),
    Corrupt(EntryId, usize),
}

fn lookup(
    collection: &dyn SharedCollection,
    location: &SharedLocation,
) -> Result<Lookup, StorageError> {
    let Some(entry) = collection.query(&location.relative_path, &location.display_name)? else {
        return Ok(Lookup::Missing);
    };
    let text = match collection.read_to_string(&entry) {
        Ok(text) => text,
        // Removed between the query and the read.
        Err(StorageError::NotFound(_)) => return Ok(Lookup::Missing),
        Err(err) => return Err(err),
    };
    Ok(match codec::decode_lines(&text) {
        Some(id) => Lookup::Found(entry, id),
        None => Lookup::Corrupt(entry, text.len()),
    })
}

fn peek_shared(collection: &dyn SharedCollection, location: &SharedLocation) -> PeekOutcome {
    match lookup(collection, location) {
        Ok(Lookup::Found(_, id)) => PeekOutcome::Found(id),
        Ok(Lookup::Missing) => PeekOutcome::Absent,
        Ok(Lookup::Corrupt(..)) => PeekOutcome::Corrupt,
        Err(err) => PeekOutcome::Unreadable(err),
    }
}

/// Returns the stored identifier, creating the record when none exists.
///
/// A failed lookup is reported rather than treated as absence, so an
/// unreadable record never causes a second one to be created.
fn provision(
    collection: &dyn SharedCollection,
    id_gen: &dyn IdGenerator,
    location: &SharedLocation,
    pending: bool,
) -> Result<DeviceId, ProvisionError> {
    match lookup(collection, location)? {
        Lookup::Found(_, id) => {
            debug!(%id, "found existing shared record");
            return Ok(id);
        }
        Lookup::Corrupt(entry, len) => {
            let id = id_gen.generate_id();
            warn!(entry = %entry.0, bytes = len, "overwriting corrupt shared record");
            collection.write(&entry, &codec::encode(&id))?;
            info!(%id, "regenerated shared record");
            return Ok(id);
        }
        Lookup::Missing => {}
    }

    if let Some(entry) = collection.find_pending(&location.relative_path, &location.display_name)? {
        let id = publish_stranded(collection, id_gen, &entry)?;
        return settle(collection, location, &entry, id);
    }

    let id = id_gen.generate_id();
    let entry = collection.insert(&NewEntry {
        relative_path: location.relative_path.clone(),
        display_name: location.display_name.clone(),
        mime_type: RECORD_MIME_TYPE.to_string(),
        pending,
    })?;
    if let Err(err) = write_and_publish(collection, &entry, &id, pending) {
        if let Err(cleanup) = collection.delete(&entry) {
            warn!(entry = %entry.0, error = %cleanup, "could not remove half-written entry");
        }
        return Err(err.into());
    }
    info!(%id, entry = %entry.0, "created shared record");
    settle(collection, location, &entry, id)
}

fn write_and_publish(
    collection: &dyn SharedCollection,
    entry: &EntryId,
    id: &DeviceId,
    pending: bool,
) -> Result<(), StorageError> {
    collection.write(entry, &codec::encode(id))?;
    if pending {
        collection.set_pending(entry, false)?;
    }
    Ok(())
}

/// Publishes an entry left provisional by an interrupted writer, keeping the
/// identifier it already holds when that decodes.
fn publish_stranded(
    collection: &dyn SharedCollection,
    id_gen: &dyn IdGenerator,
    entry: &EntryId,
) -> Result<DeviceId, StorageError> {
    let stored = collection.read_to_string(entry).ok().and_then(|t| codec::decode_lines(&t));
    let id = match stored {
        Some(id) => id,
        None => {
            let id = id_gen.generate_id();
            collection.write(entry, &codec::encode(&id))?;
            id
        }
    };
    collection.set_pending(entry, false)?;
    warn!(%id, entry = %entry.0, "published stranded shared record");
    Ok(id)
}

/// Queries again after creating `entry` and returns the oldest record, so
/// that duplicate creations converge on one identifier.
fn settle(
    collection: &dyn SharedCollection,
    location: &SharedLocation,
    entry: &EntryId,
    id: DeviceId,
) -> Result<DeviceId, ProvisionError> {
    match lookup(collection, location)? {
        Lookup::Found(oldest, found) if oldest != *entry => {
            warn!(kept = %found, dropped = %id, "older shared record exists; removing duplicate");
            if let Err(err) = collection.delete(entry) {
                warn!(entry = %entry.0, error = %err, "could not remove duplicate entry");
            }
            Ok(found)
        }
        Lookup::Found(..) | Lookup::Corrupt(..) => Ok(id),
        Lookup::Missing => {
            Err(ProvisionError::Io("Failed to create and locate device record".into()))
        }
    }
}

impl StorageBackend for SharedStorageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SharedStorage
    }

    fn peek_outcome(&self) -> PeekOutcome {
        peek_shared(self.collection.as_ref(), &self.location)
    }

    fn get_or_create(&self) -> BackendFuture<'_> {
        Box::pin(async move {
            self.ensure_capability().await?;

            let collection = Arc::clone(&self.collection);
            let id_gen = Arc::clone(&self.id_gen);
            let location = self.location.clone();
            let pending = PENDING_SDK_RANGE.contains(&self.platform.sdk_int());
            blocking(move || provision(collection.as_ref(), id_gen.as_ref(), &location, pending))
                .await
        })
    }
}
