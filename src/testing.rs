//! In-memory port fakes shared by unit tests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::codec::DeviceId;
use crate::error::StorageError;
use crate::ports::{
    CapabilityGrant, ConsentError, ConsentFuture, ConsentGateway, DirectoryGrant, DocumentDir,
    DocumentFile, DocumentTree, EntryId, IdGenerator, NewEntry, Platform, Preferences,
    SharedCollection,
};
use crate::ports::collection::{suffix_index, suffixed_name};

pub struct MemPlatform {
    pub sdk_int: u32,
    pub granted: AtomicBool,
}

impl MemPlatform {
    pub fn new(sdk_int: u32, granted: bool) -> Self {
        Self { sdk_int, granted: AtomicBool::new(granted) }
    }
}

impl Platform for MemPlatform {
    fn sdk_int(&self) -> u32 {
        self.sdk_int
    }

    fn has_storage_capability(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn remember_storage_capability(&self) -> Result<(), StorageError> {
        self.granted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Consent gateway answering from queued decisions.
#[derive(Default)]
pub struct ScriptedConsent {
    capability: Mutex<VecDeque<Result<CapabilityGrant, ConsentError>>>,
    directory: Mutex<VecDeque<Result<DirectoryGrant, ConsentError>>>,
    calls: AtomicUsize,
}

impl ScriptedConsent {
    pub fn capability(self, answer: CapabilityGrant) -> Self {
        self.capability.lock().unwrap().push_back(Ok(answer));
        self
    }

    pub fn directory(self, answer: DirectoryGrant) -> Self {
        self.directory.lock().unwrap().push_back(Ok(answer));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConsentGateway for ScriptedConsent {
    fn request_storage_capability(&self) -> ConsentFuture<'_, CapabilityGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer =
            self.capability.lock().unwrap().pop_front().unwrap_or(Err(ConsentError::Unavailable));
        Box::pin(async move { answer })
    }

    fn request_directory_grant(&self) -> ConsentFuture<'_, DirectoryGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer =
            self.directory.lock().unwrap().pop_front().unwrap_or(Err(ConsentError::Unavailable));
        Box::pin(async move { answer })
    }
}

#[derive(Debug, Clone)]
pub struct MemEntry {
    pub contents: String,
    pub pending: bool,
    /// Insertion order; lower is older.
    pub seq: usize,
}

/// Shared collection keyed by `relative_path + display_name`.
#[derive(Default)]
pub struct MemCollection {
    pub entries: Mutex<BTreeMap<String, MemEntry>>,
    pub inserts: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub fail_queries: AtomicBool,
    pub fail_reads: AtomicBool,
    /// Key and contents another writer publishes just before the next insert.
    pub competitor: Mutex<Option<(String, String)>>,
    next_seq: AtomicUsize,
}

impl MemCollection {
    pub fn seed(&self, key: &str, contents: &str) {
        self.put(key, contents, false);
    }

    /// Seeds an entry left provisional, as after an interrupted insert.
    pub fn seed_pending(&self, key: &str, contents: &str) {
        self.put(key, contents, true);
    }

    fn put(&self, key: &str, contents: &str, pending: bool) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entry = MemEntry { contents: contents.to_string(), pending, seq };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    pub fn contents(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).map(|e| e.contents.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Oldest entry matching the name (or a suffixed variant) whose pending
    /// flag equals `pending`.
    fn oldest(
        &self,
        relative_path: &str,
        display_name: &str,
        pending: bool,
    ) -> Result<Option<EntryId>, StorageError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StorageError::io("query failed"));
        }
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|(key, entry)| {
                entry.pending == pending
                    && key
                        .strip_prefix(relative_path)
                        .filter(|name| !name.contains('/'))
                        .and_then(|name| suffix_index(name, display_name))
                        .is_some()
            })
            .min_by_key(|(_, entry)| entry.seq)
            .map(|(key, _)| EntryId(key.clone())))
    }
}

impl SharedCollection for MemCollection {
    fn query(
        &self,
        relative_path: &str,
        display_name: &str,
    ) -> Result<Option<EntryId>, StorageError> {
        self.oldest(relative_path, display_name, false)
    }

    fn find_pending(
        &self,
        relative_path: &str,
        display_name: &str,
    ) -> Result<Option<EntryId>, StorageError> {
        self.oldest(relative_path, display_name, true)
    }

    fn insert(&self, entry: &NewEntry) -> Result<EntryId, StorageError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if let Some((key, contents)) = self.competitor.lock().unwrap().take() {
            self.seed(&key, &contents);
        }
        let mut key = format!("{}{}", entry.relative_path, entry.display_name);
        let mut n = 1;
        while self.entries.lock().unwrap().contains_key(&key) {
            key = format!("{}{}", entry.relative_path, suffixed_name(&entry.display_name, n));
            n += 1;
        }
        self.put(&key, "", entry.pending);
        Ok(EntryId(key))
    }

    fn read_to_string(&self, id: &EntryId) -> Result<String, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::io("read failed"));
        }
        self.contents(&id.0).ok_or_else(|| StorageError::NotFound(id.0.clone()))
    }

    fn write(&self, id: &EntryId, contents: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::io("disk full"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(&id.0).ok_or_else(|| StorageError::NotFound(id.0.clone()))?;
        entry.contents = contents.to_string();
        Ok(())
    }

    fn set_pending(&self, id: &EntryId, pending: bool) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(&id.0).ok_or_else(|| StorageError::NotFound(id.0.clone()))?;
        entry.pending = pending;
        Ok(())
    }

    fn delete(&self, id: &EntryId) -> Result<(), StorageError> {
        self.entries.lock().unwrap().remove(&id.0);
        Ok(())
    }
}

/// Document tree over an in-memory set of directories and files.
#[derive(Default)]
pub struct MemDocuments {
    pub dirs: Mutex<HashSet<String>>,
    pub files: Mutex<HashMap<String, (String, bool)>>,
    pub grants: Mutex<Vec<String>>,
    pub creates: AtomicUsize,
    pub writes: AtomicUsize,
    pub decline_create: AtomicBool,
    pub deny_writes: AtomicBool,
    pub deny_reads: AtomicBool,
    pub fail_reads: AtomicBool,
    pub fail_grants: AtomicBool,
}

impl MemDocuments {
    pub fn with_dir(self, tree: &str) -> Self {
        self.dirs.lock().unwrap().insert(tree.to_string());
        self
    }

    pub fn seed(&self, tree: &str, name: &str, contents: &str, is_file: bool) {
        self.files
            .lock()
            .unwrap()
            .insert(format!("{tree}/{name}"), (contents.to_string(), is_file));
    }

    pub fn contents(&self, tree: &str, name: &str) -> Option<String> {
        self.files.lock().unwrap().get(&format!("{tree}/{name}")).map(|(c, _)| c.clone())
    }
}

impl DocumentTree for MemDocuments {
    fn resolve_dir(&self, tree: &str) -> Option<DocumentDir> {
        self.dirs.lock().unwrap().contains(tree).then(|| DocumentDir { uri: tree.to_string() })
    }

    fn find_file(
        &self,
        dir: &DocumentDir,
        name: &str,
    ) -> Result<Option<DocumentFile>, StorageError> {
        let uri = format!("{}/{name}", dir.uri);
        let files = self.files.lock().unwrap();
        Ok(files.get(&uri).map(|(_, is_file)| DocumentFile { uri, is_file: *is_file }))
    }

    fn create_file(
        &self,
        dir: &DocumentDir,
        _mime_type: &str,
        name: &str,
    ) -> Result<Option<DocumentFile>, StorageError> {
        if self.decline_create.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        let uri = format!("{}/{name}", dir.uri);
        self.files.lock().unwrap().insert(uri.clone(), (String::new(), true));
        Ok(Some(DocumentFile { uri, is_file: true }))
    }

    fn read_to_string(&self, file: &DocumentFile) -> Result<String, StorageError> {
        if self.deny_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Security("read not permitted".into()));
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::io("read failed"));
        }
        self.files
            .lock()
            .unwrap()
            .get(&file.uri)
            .filter(|(_, is_file)| *is_file)
            .map(|(c, _)| c.clone())
            .ok_or_else(|| StorageError::NotFound(file.uri.clone()))
    }

    fn write(&self, file: &DocumentFile, contents: &str) -> Result<(), StorageError> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Security("write not permitted".into()));
        }
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&file.uri) {
            Some((existing, true)) => {
                *existing = contents.to_string();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Some((_, false)) => Err(StorageError::io("is a directory")),
            None => Err(StorageError::NotFound(file.uri.clone())),
        }
    }

    fn take_persistable_grant(&self, tree: &str) -> Result<(), StorageError> {
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(StorageError::Security("grant refused".into()));
        }
        self.grants.lock().unwrap().push(tree.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemPrefs {
    pub values: Mutex<HashMap<String, String>>,
    pub puts: AtomicUsize,
}

impl Preferences for MemPrefs {
    fn get_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.values.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Counts how many identifiers were generated.
#[derive(Default)]
pub struct CountingIds {
    pub generated: AtomicUsize,
}

impl IdGenerator for CountingIds {
    fn generate_id(&self) -> DeviceId {
        self.generated.fetch_add(1, Ordering::SeqCst);
        DeviceId::generate()
    }
}
