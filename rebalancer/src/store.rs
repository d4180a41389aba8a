//! Session key-value store: encrypted token records keyed by session.
//!
//! The vault in [`crate::session`] only ever talks to the [`SessionStore`]
//! trait, so the backing store is chosen by whoever constructs it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One stored login. The token is never held in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    pub encrypted_token: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// Get/put/delete by session key.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<SessionRecord>>;

    /// Insert or replace the record for `key`.
    fn put(&self, key: &str, record: SessionRecord) -> Result<()>;

    /// Remove the record for `key`. Returns true if one existed.
    fn delete(&self, key: &str) -> Result<bool>;
}

/// In-process store, lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<FxHashMap<String, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the stored records (for assertion in tests).
    pub fn records(&self) -> Vec<(String, SessionRecord)> {
        self.records
            .lock()
            .map(|r| r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, FxHashMap<String, SessionRecord>>> {
        self.records
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".into()))
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<SessionRecord>> {
        Ok(self.locked()?.get(key).cloned())
    }

    fn put(&self, key: &str, record: SessionRecord) -> Result<()> {
        self.locked()?.insert(key.to_string(), record);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.locked()?.remove(key).is_some())
    }
}

/// JSON file store. Each write replaces the file through a temp file + rename.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    fn read_all(&self) -> Result<BTreeMap<String, SessionRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            Error::Store(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn write_all(&self, records: &BTreeMap<String, SessionRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| Error::Store(format!("failed to serialize sessions: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<SessionRecord>> {
        Ok(self.read_all()?.remove(key))
    }

    fn put(&self, key: &str, record: SessionRecord) -> Result<()> {
        let mut records = self.read_all()?;
        records.insert(key.to_string(), record);
        self.write_all(&records)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut records = self.read_all()?;
        let existed = records.remove(key).is_some();
        if existed {
            self.write_all(&records)?;
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            username: user.into(),
            encrypted_token: "deadbeef".into(),
            created_at: now,
            last_login: now,
        }
    }

    fn exercise(store: &dyn SessionStore) {
        assert_eq!(store.get("k1").unwrap(), None);

        store.put("k1", record("alice")).unwrap();
        store.put("k2", record("bob")).unwrap();
        assert_eq!(store.get("k1").unwrap().unwrap().username, "alice");

        store.put("k1", record("alice2")).unwrap();
        assert_eq!(store.get("k1").unwrap().unwrap().username, "alice2");

        assert!(store.delete("k1").unwrap());
        assert!(!store.delete("k1").unwrap());
        assert_eq!(store.get("k1").unwrap(), None);
        assert_eq!(store.get("k2").unwrap().unwrap().username, "bob");
    }

    #[test]
    fn memory_store_contract() {
        let store = MemoryStore::new();
        exercise(&store);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("sub").join("sessions.json"));
        exercise(&store);
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        FileStore::new(&path).put("k", record("carol")).unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("k").unwrap().unwrap().username, "carol");
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileStore::new(&path).get("k"), Err(Error::Store(_))));
    }
}
