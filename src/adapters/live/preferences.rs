//! Live preferences store backed by a JSON file.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::map_io;
use crate::error::StorageError;
use crate::ports::preferences::Preferences;

/// Preferences persisted as a flat JSON object of strings.
///
/// Writes go to a temporary file that is then renamed over the target, so
/// a concurrent reader never sees a partial file.
pub struct JsonPreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPreferences {
    /// Creates a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(map_io(e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::io(format!("failed to parse {}: {e}", self.path.display()))
        })
    }
}

impl Preferences for JsonPreferences {
    fn get_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&values)
            .map_err(|e| StorageError::io(format!("failed to serialize preferences: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(map_io)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(map_io)?;
        std::fs::rename(&tmp, &self.path).map_err(map_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonPreferences::new(dir.path().join("prefs.json"));
        assert_eq!(prefs.get_string("treeUri").unwrap(), None);
    }

    #[test]
    fn values_survive_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let prefs = JsonPreferences::new(&path);
        prefs.put_string("treeUri", "file:///a").unwrap();
        prefs.put_string("other", "b").unwrap();
        prefs.put_string("treeUri", "file:///a").unwrap();

        let reopened = JsonPreferences::new(&path);
        assert_eq!(reopened.get_string("treeUri").unwrap().as_deref(), Some("file:///a"));
        assert_eq!(reopened.get_string("other").unwrap().as_deref(), Some("b"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let prefs = JsonPreferences::new(&path);
        assert!(prefs.get_string("treeUri").is_err());
    }
}
