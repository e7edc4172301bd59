//! # File-backed key-value store
//!
//! [`FileStore`] keeps every key in a single pretty-printed JSON object:
//!
//! ```text
//! {
//!   "token": "eyJhbGciOi...",
//!   "user": "{\"username\":\"ana\"}"
//! }
//! ```
//!
//! The default location comes from [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.local/share/edudata/session.json` |
//! | macOS | `~/Library/Application Support/edudata/session.json` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\edudata\session.json` |
//!
//! A missing file reads as an empty store; the parent directory is created on first write.
//! Writes go to a temporary file in the same directory that is then renamed over the
//! target, so readers never see a half-written file. A file that is corrupt anyway is
//! discarded by [`remove`](KeyValueStore::remove), which keeps logout and `401`
//! eviction working.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{KeyValueStore, StoreError};

/// Durable [`KeyValueStore`] backed by one JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles from within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store located in the platform data directory (`<data_dir>/edudata/session.json`).
    pub fn in_data_dir() -> Result<Self, StoreError> {
        let base = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(base.join("edudata").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let json = serde_json::to_vec_pretty(entries)?;

        // 1. Write and flush a sibling temp file
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;

        // 2. Swap it in
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), keys = entries.len(), "Session file written");
        Ok(())
    }

    /// Read-modify-write under the process lock. With `discard_corrupt`, an unreadable
    /// file is replaced by whatever `f` leaves in an empty map.
    fn modify<F>(&self, discard_corrupt: bool, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let (mut entries, discarded) = match self.read_all() {
            Err(StoreError::Corrupt(e)) if discard_corrupt => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session file");
                (BTreeMap::new(), true)
            }
            other => (other?, false),
        };
        if f(&mut entries) || discarded {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(false, |entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(true, |entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{TOKEN_KEY, USER_KEY};
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        // Removing from a missing file does not create it
        store.remove(TOKEN_KEY).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edudata").join("session.json");

        let store = FileStore::new(&path);
        store.set(TOKEN_KEY, "tok-1").unwrap();
        store.set(USER_KEY, r#"{"username":"ana"}"#).unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));
        assert_eq!(
            reopened.get(USER_KEY).unwrap().as_deref(),
            Some(r#"{"username":"ana"}"#)
        );

        reopened.remove(TOKEN_KEY).unwrap();
        assert!(FileStore::new(&path).get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get(TOKEN_KEY), Err(StoreError::Corrupt(_))));
        // Writes refuse to clobber data they cannot read
        assert!(matches!(store.set(TOKEN_KEY, "x"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_remove_recovers_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        // A write cut short halfway through the object
        fs::write(&path, "{\n  \"token\": \"tok-").unwrap();

        let store = FileStore::new(&path);
        store.remove(TOKEN_KEY).unwrap();
        store.remove(USER_KEY).unwrap();
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        assert!(store.get(USER_KEY).unwrap().is_none());

        store.set(TOKEN_KEY, "fresh").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        store.set(TOKEN_KEY, "a").unwrap();
        store.set(USER_KEY, "{}").unwrap();
        store.remove(USER_KEY).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["session.json"]);
    }
}
