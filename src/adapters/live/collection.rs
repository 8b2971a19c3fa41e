//! Live shared collection backed by a directory tree.
//!
//! Entries live at `<root>/<relative_path><display_name>`. A provisional
//! entry carries a `.<display_name>.pending` sidecar and is hidden from
//! queries until the sidecar is removed.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::map_io;
use crate::error::StorageError;
use crate::ports::collection::{suffix_index, suffixed_name, EntryId, NewEntry, SharedCollection};

/// Shared collection rooted at a directory on disk.
pub struct LiveSharedCollection {
    root: PathBuf,
}

/// An entry whose name matches the queried display name.
struct Candidate {
    id: EntryId,
    pending: bool,
    created: Option<SystemTime>,
    suffix: u32,
}

impl LiveSharedCollection {
    /// Creates a collection rooted at `root`. The directory is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, id: &EntryId) -> PathBuf {
        self.root.join(&id.0)
    }

    fn sidecar_of(path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?.to_str()?;
        Some(path.with_file_name(format!(".{name}.pending")))
    }

    fn is_pending(path: &Path) -> bool {
        Self::sidecar_of(path).is_some_and(|s| s.exists())
    }

    /// Files in `relative_path` named `display_name` or a suffixed variant,
    /// oldest first. Entries without a creation time order by suffix.
    fn candidates(
        &self,
        relative_path: &str,
        display_name: &str,
    ) -> Result<Vec<Candidate>, StorageError> {
        let dir = match std::fs::read_dir(self.root.join(relative_path)) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io(e)),
        };

        let mut found = Vec::new();
        for entry in dir {
            let entry = entry.map_err(map_io)?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Some(suffix) = suffix_index(&name, display_name) else {
                continue;
            };
            let meta = entry.metadata().map_err(map_io)?;
            if !meta.is_file() {
                continue;
            }
            found.push(Candidate {
                id: EntryId(format!("{relative_path}{name}")),
                pending: Self::is_pending(&entry.path()),
                created: meta.created().ok(),
                suffix,
            });
        }
        found.sort_by_key(|c| (c.created, c.suffix));
        Ok(found)
    }
}

impl SharedCollection for LiveSharedCollection {
    fn query(
        &self,
        relative_path: &str,
        display_name: &str,
    ) -> Result<Option<EntryId>, StorageError> {
        let found = self.candidates(relative_path, display_name)?;
        Ok(found.into_iter().find(|c| !c.pending).map(|c| c.id))
    }

    fn find_pending(
        &self,
        relative_path: &str,
        display_name: &str,
    ) -> Result<Option<EntryId>, StorageError> {
        let found = self.candidates(relative_path, display_name)?;
        Ok(found.into_iter().find(|c| c.pending).map(|c| c.id))
    }

    fn insert(&self, entry: &NewEntry) -> Result<EntryId, StorageError> {
        let folder = self.root.join(&entry.relative_path);
        std::fs::create_dir_all(&folder).map_err(map_io)?;

        // Name collisions get a " (n)" suffix, like the platform collection.
        let mut candidate = entry.display_name.clone();
        let mut n = 1;
        let path = loop {
            let path = folder.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => break path,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = suffixed_name(&entry.display_name, n);
                    n += 1;
                }
                Err(e) => return Err(map_io(e)),
            }
        };

        if entry.pending {
            if let Some(sidecar) = Self::sidecar_of(&path) {
                std::fs::write(sidecar, entry.mime_type.as_bytes()).map_err(map_io)?;
            }
        }

        let id = EntryId(format!("{}{candidate}", entry.relative_path));
        debug!(entry = %id.0, pending = entry.pending, "inserted collection entry");
        Ok(id)
    }

    fn read_to_string(&self, id: &EntryId) -> Result<String, StorageError> {
        std::fs::read_to_string(self.path_of(id)).map_err(map_io)
    }

    fn write(&self, id: &EntryId, contents: &str) -> Result<(), StorageError> {
        let path = self.path_of(id);
        if !path.is_file() {
            return Err(StorageError::NotFound(id.0.clone()));
        }
        std::fs::write(path, contents).map_err(map_io)
    }

    fn set_pending(&self, id: &EntryId, pending: bool) -> Result<(), StorageError> {
        let path = self.path_of(id);
        let sidecar = Self::sidecar_of(&path)
            .ok_or_else(|| StorageError::NotFound(id.0.clone()))?;
        if pending {
            std::fs::write(sidecar, b"").map_err(map_io)
        } else {
            match std::fs::remove_file(sidecar) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(map_io(e)),
                _ => Ok(()),
            }
        }
    }

    fn delete(&self, id: &EntryId) -> Result<(), StorageError> {
        let path = self.path_of(id);
        if let Some(sidecar) = Self::sidecar_of(&path) {
            let _ = std::fs::remove_file(sidecar);
        }
        std::fs::remove_file(path).map_err(map_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOLDER: &str = "Download/Device-ID-Provider/";
    const NAME: &str = "device-id-provider.json";

    fn new_entry(pending: bool) -> NewEntry {
        NewEntry {
            relative_path: FOLDER.into(),
            display_name: NAME.into(),
            mime_type: "application/json".into(),
            pending,
        }
    }

    #[test]
    fn insert_write_query_read() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());

        assert_eq!(collection.query(FOLDER, NAME).unwrap(), None);

        let id = collection.insert(&new_entry(false)).unwrap();
        collection.write(&id, "hello\n").unwrap();

        assert_eq!(collection.query(FOLDER, NAME).unwrap(), Some(id.clone()));
        assert_eq!(collection.read_to_string(&id).unwrap(), "hello\n");
        assert!(dir.path().join(FOLDER).join(NAME).is_file());
    }

    #[test]
    fn pending_entries_are_hidden_until_finalized() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());

        let id = collection.insert(&new_entry(true)).unwrap();
        collection.write(&id, "x").unwrap();
        assert_eq!(collection.query(FOLDER, NAME).unwrap(), None);

        collection.set_pending(&id, false).unwrap();
        assert_eq!(collection.query(FOLDER, NAME).unwrap(), Some(id));
    }

    #[test]
    fn colliding_insert_gets_suffixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());

        let first = collection.insert(&new_entry(false)).unwrap();
        let second = collection.insert(&new_entry(false)).unwrap();

        assert_eq!(first.0, format!("{FOLDER}{NAME}"));
        assert_eq!(second.0, format!("{FOLDER}device-id-provider (1).json"));
    }

    #[test]
    fn delete_removes_entry_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());

        let id = collection.insert(&new_entry(true)).unwrap();
        collection.delete(&id).unwrap();

        assert!(std::fs::read_dir(dir.path().join(FOLDER)).unwrap().next().is_none());
    }

    #[test]
    fn write_to_missing_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());
        let err = collection.write(&EntryId("nope.json".into()), "x").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn query_skips_pending_canonical_and_finds_suffixed_entry() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());

        let stranded = collection.insert(&new_entry(true)).unwrap();
        let published = collection.insert(&new_entry(false)).unwrap();
        collection.write(&published, "x").unwrap();

        assert_eq!(published.0, format!("{FOLDER}device-id-provider (1).json"));
        assert_eq!(collection.query(FOLDER, NAME).unwrap(), Some(published));
        assert_eq!(collection.find_pending(FOLDER, NAME).unwrap(), Some(stranded));
    }

    #[test]
    fn query_returns_oldest_match() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());

        let first = collection.insert(&new_entry(false)).unwrap();
        collection.insert(&new_entry(false)).unwrap();
        collection.insert(&new_entry(false)).unwrap();

        assert_eq!(collection.query(FOLDER, NAME).unwrap(), Some(first));
        assert_eq!(collection.find_pending(FOLDER, NAME).unwrap(), None);
    }

    #[test]
    fn query_ignores_other_names_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LiveSharedCollection::new(dir.path());
        let folder = dir.path().join(FOLDER);
        std::fs::create_dir_all(folder.join(NAME)).unwrap();
        std::fs::write(folder.join("notes.json"), "x").unwrap();

        assert_eq!(collection.query(FOLDER, NAME).unwrap(), None);
    }
}
