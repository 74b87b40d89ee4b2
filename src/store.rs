//! Local persistence: session credentials and the pending-queue cache.
//!
//! Both sit on a small [`KeyValueStore`] capability so the engine never knows
//! where the bytes live. [`FileStore`] is the shipping adapter (one JSON map
//! file, written whole via temp-file-and-rename so a snapshot is never
//! half-persisted); [`MemoryStore`] backs tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::workflow::CachedQueue;

const KEY_COOKIE: &str = "cookie";
const KEY_USERNAME: &str = "username";
const KEY_PASSWORD: &str = "password";
const KEY_SERVICE_ACCOUNT: &str = "service_account";
const KEY_QUEUE: &str = "queue";

/// Synchronous string key-value persistence. Single writer (the engine).
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// File-backed store holding the whole map in one JSON document.
pub struct FileStore {
    path: PathBuf,
    map: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or create) the store file at `path`, loading any existing map.
    /// An unreadable file starts the store empty rather than failing.
    pub fn open(path: PathBuf) -> Self {
        let map = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self {
            path,
            map: Mutex::new(map),
        }
    }

    fn persist(&self, map: &BTreeMap<String, String>) {
        let Ok(json) = serde_json::to_string_pretty(map) else {
            return;
        };
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = self.path.with_extension("tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, &self.path);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().expect("store lock").get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        let mut map = self.map.lock().expect("store lock");
        map.insert(key.to_string(), value.to_string());
        self.persist(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.map.lock().expect("store lock");
        map.remove(key);
        self.persist(&map);
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().expect("store lock").get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.map
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.lock().expect("store lock").remove(key);
    }
}

/// Credential and session persistence. The service-account blob survives
/// logout; only the auth triple is cleared.
pub struct SessionStore {
    store: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save_auth(&self, cookie: &str, username: &str, password: &str) {
        self.store.put(KEY_COOKIE, cookie);
        self.store.put(KEY_USERNAME, username);
        self.store.put(KEY_PASSWORD, password);
    }

    pub fn cookie(&self) -> Option<String> {
        self.store.get(KEY_COOKIE)
    }

    pub fn username(&self) -> Option<String> {
        self.store.get(KEY_USERNAME)
    }

    pub fn password(&self) -> Option<String> {
        self.store.get(KEY_PASSWORD)
    }

    pub fn save_service_account(&self, blob: &str) {
        self.store.put(KEY_SERVICE_ACCOUNT, blob);
    }

    pub fn service_account(&self) -> Option<String> {
        self.store.get(KEY_SERVICE_ACCOUNT)
    }

    pub fn clear_auth(&self) {
        self.store.remove(KEY_COOKIE);
        self.store.remove(KEY_USERNAME);
        self.store.remove(KEY_PASSWORD);
    }
}

/// Persistence for the last-fetched queue snapshot.
pub struct QueueCache {
    store: Box<dyn KeyValueStore>,
}

impl QueueCache {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, snapshot: &CachedQueue) {
        if let Ok(json) = serde_json::to_string(snapshot) {
            self.store.put(KEY_QUEUE, &json);
        }
    }

    pub fn load(&self) -> Option<CachedQueue> {
        let json = self.store.get(KEY_QUEUE)?;
        serde_json::from_str(&json).ok()
    }

    pub fn clear(&self) {
        self.store.remove(KEY_QUEUE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{PendingRow, Queue};

    fn sample_snapshot() -> CachedQueue {
        CachedQueue::new(Queue::new(
            vec!["NO".into(), "NPSN".into()],
            vec![PendingRow {
                row_index: 4,
                cells: vec!["1".into(), "10101010".into()],
            }],
        ))
    }

    #[test]
    fn file_store_roundtrip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verval.json");

        let store = FileStore::open(path.clone());
        store.put("cookie", "abc123");
        store.put("username", "siti");
        store.remove("username");
        drop(store);

        let store = FileStore::open(path);
        assert_eq!(store.get("cookie"), Some("abc123".into()));
        assert_eq!(store.get("username"), None);
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verval.json");
        fs::write(&path, "{corrupt").unwrap();

        let store = FileStore::open(path);
        assert_eq!(store.get("cookie"), None);
        store.put("cookie", "new");
        assert_eq!(store.get("cookie"), Some("new".into()));
    }

    #[test]
    fn session_store_clear_keeps_service_account() {
        let session = SessionStore::new(Box::new(MemoryStore::default()));
        session.save_auth("abc", "siti", "rahasia");
        session.save_service_account("{\"access_token\":\"t\"}");

        session.clear_auth();
        assert_eq!(session.cookie(), None);
        assert_eq!(session.username(), None);
        assert_eq!(session.password(), None);
        assert!(session.service_account().is_some());
    }

    #[test]
    fn queue_cache_roundtrip() {
        let cache = QueueCache::new(Box::new(MemoryStore::default()));
        let snapshot = sample_snapshot();
        cache.save(&snapshot);
        assert_eq!(cache.load(), Some(snapshot));

        cache.clear();
        assert_eq!(cache.load(), None);
    }

    #[test]
    fn queue_cache_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verval.json");
        let snapshot = sample_snapshot();

        let cache = QueueCache::new(Box::new(FileStore::open(path.clone())));
        cache.save(&snapshot);
        drop(cache);

        let cache = QueueCache::new(Box::new(FileStore::open(path)));
        assert_eq!(cache.load(), Some(snapshot));
    }
}
