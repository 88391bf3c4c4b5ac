//! In-memory [`Session`] backend for tests.
//!
//! Holds the whole remote target (metadata map, folders, files, library
//! policies) behind `std::sync::RwLock`, and records every mutating call in
//! an operation journal so tests can assert exactly which remote calls a run
//! performed (e.g. no upload on a second, unchanged synchronization).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::error::SessionError;
use crate::log::UpgradeLog;
use crate::path;
use crate::session::{Session, SessionProvider};
use crate::types::{CheckinKind, FileStatus, FolderInfo, LibraryPolicy};

/// One mutating remote call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    SetProperty { key: String },
    CreateFolder { path: String },
    Upload { path: String },
    CheckOut { path: String },
    CheckIn { path: String, kind: CheckinKind },
    Publish { path: String },
    Approve { path: String },
}

/// A stored file with its workflow state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub checked_out: bool,
    pub published: bool,
    pub approved: bool,
}

#[derive(Debug, Default)]
struct State {
    properties: BTreeMap<String, String>,
    folders: BTreeSet<String>,
    files: BTreeMap<String, StoredFile>,
    policies: Vec<(String, LibraryPolicy)>,
    operations: Vec<Operation>,
}

/// In-memory remote repository for testing.
///
/// Cloning shares the underlying state, and the clone is what
/// [`SessionProvider::open_session`] hands out, so a test can keep its own
/// handle to inspect state after a run while the engine owns the session.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    state: Arc<RwLock<State>>,
    site_path: String,
    web_path: String,
}

impl MemoryRepository {
    /// Repository rooted at `/` for both site collection and web.
    pub fn new() -> Self {
        Self::with_paths("/", "/")
    }

    /// Repository with distinct site collection and web roots.
    pub fn with_paths(site_path: impl Into<String>, web_path: impl Into<String>) -> Self {
        let site_path = site_path.into();
        let web_path = web_path.into();
        let mut state = State::default();
        state.folders.insert(site_path.clone());
        state.folders.insert(web_path.clone());
        Self {
            state: Arc::new(RwLock::new(state)),
            site_path,
            web_path,
        }
    }

    /// Registers an existing folder.
    pub fn add_folder(&self, folder_path: impl Into<String>) {
        self.state
            .write()
            .unwrap()
            .folders
            .insert(folder_path.into());
    }

    /// Attaches a library policy to a folder subtree.
    pub fn set_policy(&self, folder_path: impl Into<String>, policy: LibraryPolicy) {
        self.state
            .write()
            .unwrap()
            .policies
            .push((folder_path.into(), policy));
    }

    /// Snapshot of the operations recorded so far.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.read().unwrap().operations.clone()
    }

    /// Drops recorded operations, keeping all other state.
    pub fn clear_operations(&self) {
        self.state.write().unwrap().operations.clear();
    }

    /// Snapshot of a stored file.
    pub fn file(&self, file_path: &str) -> Option<StoredFile> {
        self.state.read().unwrap().files.get(file_path).cloned()
    }

    /// Reads one metadata value without going through the session trait.
    pub fn stored_property(&self, key: &str) -> Option<String> {
        self.state.read().unwrap().properties.get(key).cloned()
    }

    fn record(&self, operation: Operation) {
        self.state.write().unwrap().operations.push(operation);
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MemoryRepository {
    fn site_path(&self) -> &str {
        &self.site_path
    }

    fn web_path(&self) -> &str {
        &self.web_path
    }

    fn properties(&self) -> Result<BTreeMap<String, String>, SessionError> {
        Ok(self.state.read().unwrap().properties.clone())
    }

    fn set_property(&self, key: &str, value: &str) -> Result<(), SessionError> {
        {
            let mut state = self.state.write().unwrap();
            state.properties.insert(key.to_string(), value.to_string());
        }
        self.record(Operation::SetProperty {
            key: key.to_string(),
        });
        Ok(())
    }

    fn get_folder(&self, folder_path: &str) -> Result<FolderInfo, SessionError> {
        let state = self.state.read().unwrap();
        if state.folders.contains(folder_path) {
            Ok(FolderInfo::new(folder_path))
        } else {
            Err(SessionError::NotFound {
                path: folder_path.to_string(),
            })
        }
    }

    fn create_folder(&self, parent: &str, name: &str) -> Result<FolderInfo, SessionError> {
        let created = {
            let mut state = self.state.write().unwrap();
            if !state.folders.contains(parent) {
                return Err(SessionError::NotFound {
                    path: parent.to_string(),
                });
            }
            let created = path::combine(parent, name);
            state.folders.insert(created.clone());
            created
        };
        self.record(Operation::CreateFolder {
            path: created.clone(),
        });
        Ok(FolderInfo::new(created))
    }

    fn file_status(&self, file_path: &str) -> Result<FileStatus, SessionError> {
        let state = self.state.read().unwrap();
        match state.files.get(file_path) {
            Some(file) => Ok(FileStatus {
                checked_out: file.checked_out,
            }),
            None => Err(SessionError::NotFound {
                path: file_path.to_string(),
            }),
        }
    }

    fn library_policy(&self, file_path: &str) -> Result<Option<LibraryPolicy>, SessionError> {
        let state = self.state.read().unwrap();
        // Longest matching folder prefix wins.
        let policy = state
            .policies
            .iter()
            .filter(|(folder, _)| path::is_under(file_path, folder))
            .max_by_key(|(folder, _)| folder.len())
            .map(|(_, policy)| *policy);
        Ok(policy)
    }

    fn upload_file(
        &self,
        folder: &str,
        name: &str,
        content: &[u8],
    ) -> Result<String, SessionError> {
        let destination = {
            let mut state = self.state.write().unwrap();
            if !state.folders.contains(folder) {
                return Err(SessionError::NotFound {
                    path: folder.to_string(),
                });
            }
            let destination = path::combine(folder, name);
            let file = state.files.entry(destination.clone()).or_default();
            file.content = content.to_vec();
            // A fresh upload is an unpublished, unapproved draft again.
            file.published = false;
            file.approved = false;
            destination
        };
        self.record(Operation::Upload {
            path: destination.clone(),
        });
        Ok(destination)
    }

    fn check_out(&self, file_path: &str) -> Result<(), SessionError> {
        {
            let mut state = self.state.write().unwrap();
            let file = state.files.get_mut(file_path).ok_or(SessionError::NotFound {
                path: file_path.to_string(),
            })?;
            file.checked_out = true;
        }
        self.record(Operation::CheckOut {
            path: file_path.to_string(),
        });
        Ok(())
    }

    fn check_in(
        &self,
        file_path: &str,
        _comment: &str,
        kind: CheckinKind,
    ) -> Result<(), SessionError> {
        {
            let mut state = self.state.write().unwrap();
            let file = state.files.get_mut(file_path).ok_or(SessionError::NotFound {
                path: file_path.to_string(),
            })?;
            file.checked_out = false;
        }
        self.record(Operation::CheckIn {
            path: file_path.to_string(),
            kind,
        });
        Ok(())
    }

    fn publish(&self, file_path: &str, _comment: &str) -> Result<(), SessionError> {
        {
            let mut state = self.state.write().unwrap();
            let file = state.files.get_mut(file_path).ok_or(SessionError::NotFound {
                path: file_path.to_string(),
            })?;
            file.published = true;
        }
        self.record(Operation::Publish {
            path: file_path.to_string(),
        });
        Ok(())
    }

    fn approve(&self, file_path: &str, _comment: &str) -> Result<(), SessionError> {
        {
            let mut state = self.state.write().unwrap();
            let file = state.files.get_mut(file_path).ok_or(SessionError::NotFound {
                path: file_path.to_string(),
            })?;
            file.approved = true;
        }
        self.record(Operation::Approve {
            path: file_path.to_string(),
        });
        Ok(())
    }
}

impl SessionProvider for MemoryRepository {
    fn open_session(&self, log: &dyn UpgradeLog) -> Result<Box<dyn Session>, SessionError> {
        log.verbose(&format!("Opening in-memory session at '{}'", self.web_path));
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NullLog;

    #[test]
    fn upload_requires_existing_folder() {
        let repo = MemoryRepository::new();
        let err = repo.upload_file("/missing", "a.txt", b"x").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn upload_resets_workflow_state() {
        let repo = MemoryRepository::new();
        repo.add_folder("/docs");
        let dest = repo.upload_file("/docs", "a.txt", b"one").unwrap();
        repo.publish(&dest, "test").unwrap();
        repo.approve(&dest, "test").unwrap();

        repo.upload_file("/docs", "a.txt", b"two").unwrap();
        let file = repo.file(&dest).unwrap();
        assert_eq!(file.content, b"two");
        assert!(!file.published);
        assert!(!file.approved);
    }

    #[test]
    fn policy_prefers_longest_prefix() {
        let repo = MemoryRepository::new();
        repo.set_policy(
            "/docs",
            LibraryPolicy {
                force_checkout: false,
                ..Default::default()
            },
        );
        repo.set_policy(
            "/docs/inner",
            LibraryPolicy {
                force_checkout: true,
                ..Default::default()
            },
        );

        let policy = repo.library_policy("/docs/inner/a.txt").unwrap().unwrap();
        assert!(policy.force_checkout);
        let policy = repo.library_policy("/docs/a.txt").unwrap().unwrap();
        assert!(!policy.force_checkout);
        assert!(repo.library_policy("/elsewhere/a.txt").unwrap().is_none());
    }

    #[test]
    fn session_clone_shares_state() {
        let repo = MemoryRepository::new();
        let session = repo.open_session(&NullLog).unwrap();
        session.set_property("k", "v").unwrap();
        drop(session);
        assert_eq!(repo.stored_property("k").as_deref(), Some("v"));
        assert_eq!(
            repo.operations(),
            vec![Operation::SetProperty { key: "k".into() }]
        );
    }
}
