//! Hash stores: the persisted record of what content was last uploaded.
//!
//! [`PropertyHashStore`] keeps the whole path-to-hash map as one JSON object
//! in the session's metadata store, reads it lazily once per instance, and
//! rewrites it entirely on every store. Keys are web-relative paths,
//! lowercased so lookups survive remote case differences; hash values are
//! lowercase hex.

use std::cell::RefCell;
use std::collections::BTreeMap;

use tidemark_core::{path, Session, UpgradeLog};

use crate::error::HashStoreError;

/// Metadata key used when none is configured.
pub const DEFAULT_KEY: &str = "tidemark/upload-hashes";

/// Tracks which content was last uploaded for each destination path.
pub trait HashStore {
    /// Stored hash for a destination path; empty when unknown.
    fn file_hash(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        file_path: &str,
    ) -> Result<Vec<u8>, HashStoreError>;

    /// Records the uploaded hash for a destination path.
    fn store_file_hash(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        file_path: &str,
        hash: &[u8],
    ) -> Result<(), HashStoreError>;
}

/// Hash store backed by a single metadata value on the session.
///
/// A corrupt stored map degrades to empty with a warning, which makes every
/// file look changed and re-uploads it; the next store writes a clean map.
pub struct PropertyHashStore {
    key: String,
    cache: RefCell<Option<BTreeMap<String, String>>>,
}

impl PropertyHashStore {
    /// Store under [`DEFAULT_KEY`].
    pub fn new() -> Self {
        Self::with_key(DEFAULT_KEY)
    }

    /// Store under a custom metadata key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cache: RefCell::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Web-relative, lowercased map key for a destination path.
    fn map_key(session: &dyn Session, file_path: &str) -> String {
        let resolved = path::resolve(file_path, session.site_path(), session.web_path());
        path::web_relative(&resolved, session.web_path()).to_lowercase()
    }

    fn with_map<R>(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> R,
    ) -> Result<R, HashStoreError> {
        let mut cache = self.cache.borrow_mut();
        if cache.is_none() {
            *cache = Some(self.read_map(session, log)?);
        }
        let map = cache.get_or_insert_with(BTreeMap::new);
        Ok(f(map))
    }

    fn read_map(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
    ) -> Result<BTreeMap<String, String>, HashStoreError> {
        let map = match session.property(&self.key)? {
            Some(value) => match serde_json::from_str(&value) {
                Ok(map) => map,
                Err(_) => {
                    log.warning(&format!(
                        "Hash map under '{}' could not be parsed, starting empty; \
                         every file will be treated as changed",
                        self.key
                    ));
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
        Ok(map)
    }
}

impl Default for PropertyHashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HashStore for PropertyHashStore {
    fn file_hash(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        file_path: &str,
    ) -> Result<Vec<u8>, HashStoreError> {
        let map_key = Self::map_key(session, file_path);
        let stored = self.with_map(session, log, |map| map.get(&map_key).cloned())?;
        let Some(text) = stored else {
            return Ok(Vec::new());
        };
        match hex::decode(&text) {
            Ok(hash) => Ok(hash),
            Err(_) => {
                log.warning(&format!(
                    "Stored hash for '{map_key}' is not valid hex, treating as changed"
                ));
                Ok(Vec::new())
            }
        }
    }

    fn store_file_hash(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        file_path: &str,
        hash: &[u8],
    ) -> Result<(), HashStoreError> {
        let map_key = Self::map_key(session, file_path);
        log.verbose(&format!("Storing upload hash for '{map_key}'"));
        let json = self
            .with_map(session, log, |map| {
                map.insert(map_key, hex::encode(hash));
                serde_json::to_string(map)
            })?
            .map_err(HashStoreError::Serialize)?;
        session.set_property(&self.key, &json)?;
        Ok(())
    }
}

/// Hash store that never remembers anything.
///
/// Every lookup is unknown, so every file counts as changed and uploads on
/// every run. Opt-in, for forcing a full re-upload.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHashStore;

impl HashStore for NullHashStore {
    fn file_hash(
        &self,
        _session: &dyn Session,
        _log: &dyn UpgradeLog,
        _file_path: &str,
    ) -> Result<Vec<u8>, HashStoreError> {
        Ok(Vec::new())
    }

    fn store_file_hash(
        &self,
        _session: &dyn Session,
        _log: &dyn UpgradeLog,
        _file_path: &str,
        _hash: &[u8],
    ) -> Result<(), HashStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidemark_core::{MemoryRepository, NullLog};

    #[test]
    fn unknown_path_reads_empty() {
        let repo = MemoryRepository::new();
        let store = PropertyHashStore::new();
        let hash = store.file_hash(&repo, &NullLog, "/style/app.css").unwrap();
        assert!(hash.is_empty());
    }

    #[test]
    fn stores_and_reads_back_web_relative_lowercased() {
        let repo = MemoryRepository::with_paths("/", "/teams/a");
        let store = PropertyHashStore::new();
        store
            .store_file_hash(&repo, &NullLog, "~site/Style Library/App.css", &[0xab, 0xcd])
            .unwrap();

        let raw = repo.stored_property(DEFAULT_KEY).expect("map persisted");
        assert!(raw.contains("style library/app.css"), "raw map: {raw}");
        assert!(raw.contains("abcd"));

        // A fresh instance reads from the persisted map.
        let fresh = PropertyHashStore::new();
        let hash = fresh
            .file_hash(&repo, &NullLog, "~site/style library/app.css")
            .unwrap();
        assert_eq!(hash, vec![0xab, 0xcd]);
    }

    #[test]
    fn corrupt_map_reads_empty() {
        let repo = MemoryRepository::new();
        repo.set_property(DEFAULT_KEY, "{not json").unwrap();
        let store = PropertyHashStore::new();
        let hash = store.file_hash(&repo, &NullLog, "/a.css").unwrap();
        assert!(hash.is_empty());
    }

    #[test]
    fn invalid_hex_value_reads_empty() {
        let repo = MemoryRepository::new();
        repo.set_property(DEFAULT_KEY, r#"{"a.css":"zz-not-hex"}"#).unwrap();
        let store = PropertyHashStore::new();
        let hash = store.file_hash(&repo, &NullLog, "/a.css").unwrap();
        assert!(hash.is_empty());
    }

    #[test]
    fn store_preserves_other_entries() {
        let repo = MemoryRepository::new();
        let store = PropertyHashStore::new();
        store.store_file_hash(&repo, &NullLog, "/a.css", &[1]).unwrap();
        store.store_file_hash(&repo, &NullLog, "/b.css", &[2]).unwrap();

        let fresh = PropertyHashStore::new();
        assert_eq!(fresh.file_hash(&repo, &NullLog, "/a.css").unwrap(), vec![1]);
        assert_eq!(fresh.file_hash(&repo, &NullLog, "/b.css").unwrap(), vec![2]);
    }

    #[test]
    fn null_store_never_remembers() {
        let repo = MemoryRepository::new();
        let store = NullHashStore;
        store.store_file_hash(&repo, &NullLog, "/a.css", &[1]).unwrap();
        assert!(store.file_hash(&repo, &NullLog, "/a.css").unwrap().is_empty());
        assert!(repo.properties().unwrap().is_empty());
    }
}
