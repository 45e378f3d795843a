//! Device-local store backed by one JSON file per key.
//!
//! ```text
//! <cache_dir>/
//! ├── customers_B1.json
//! ├── receipts_B1.json
//! ├── drafts_B1.json
//! └── audit_log.json
//! ```
//!
//! Writes go to a temporary file that is then renamed over the target, so a
//! crash mid-write leaves the previous value in place.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::store::{LocalStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    /// Opens (and creates if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(?dir, "Opened local file store");
        Ok(FileLocalStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::Rejected(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("goreceipt-{}-{}", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_set_get_remove() {
        let dir = temp_dir("files");
        let store = FileLocalStore::open(&dir).unwrap();

        assert_eq!(store.get("customers_B1").unwrap(), None);
        store.set("customers_B1", "[]").unwrap();
        assert_eq!(store.get("customers_B1").unwrap().as_deref(), Some("[]"));
        assert!(dir.join("customers_B1.json").exists());

        store.remove("customers_B1").unwrap();
        store.remove("customers_B1").unwrap();
        assert_eq!(store.get("customers_B1").unwrap(), None);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = temp_dir("keys");
        let store = FileLocalStore::open(&dir).unwrap();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.set("a/b", "x").is_err());
        assert!(store.get("").is_err());
        fs::remove_dir_all(dir).ok();
    }
}
