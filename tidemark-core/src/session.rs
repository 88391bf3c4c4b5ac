//! Session boundary to the remote content repository.
//!
//! Everything the engines do remotely goes through [`Session`]; where the
//! session comes from is [`SessionProvider`]'s business. A session is a
//! scope: the provider hands out an owned `Box<dyn Session>` and dropping it
//! closes the connection, so every exit path of an engine run releases the
//! session without explicit close calls.
//!
//! Backends in this crate: [`MemoryRepository`](crate::memory::MemoryRepository)
//! (tests) and [`FsRepository`](crate::fs::FsRepository) (local directory).

use std::collections::BTreeMap;

use crate::error::SessionError;
use crate::log::UpgradeLog;
use crate::types::{CheckinKind, FileStatus, FolderInfo, LibraryPolicy};

/// A connected session to one remote target.
///
/// Paths are server-relative. Operations that probe for existence report a
/// missing object as [`SessionError::NotFound`], which callers may treat as
/// a signal rather than a failure.
pub trait Session {
    /// Server-relative path of the site collection root.
    fn site_path(&self) -> &str;

    /// Server-relative path of the current web root.
    fn web_path(&self) -> &str;

    /// Reads the whole metadata map of the current web.
    fn properties(&self) -> Result<BTreeMap<String, String>, SessionError>;

    /// Reads one metadata value.
    fn property(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.properties()?.remove(key))
    }

    /// Writes one metadata value.
    fn set_property(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Fetches an existing folder.
    fn get_folder(&self, path: &str) -> Result<FolderInfo, SessionError>;

    /// Creates a folder inside an existing parent.
    fn create_folder(&self, parent: &str, name: &str) -> Result<FolderInfo, SessionError>;

    /// Status of an existing file.
    fn file_status(&self, path: &str) -> Result<FileStatus, SessionError>;

    /// Versioning policy of the library containing `path`.
    ///
    /// `Ok(None)` means the destination is not inside a library; no checkout
    /// workflow applies.
    fn library_policy(&self, path: &str) -> Result<Option<LibraryPolicy>, SessionError>;

    /// Uploads content into a folder, overwriting any existing file.
    ///
    /// Returns the server-relative path of the uploaded file.
    fn upload_file(&self, folder: &str, name: &str, content: &[u8])
        -> Result<String, SessionError>;

    /// Checks a file out.
    fn check_out(&self, path: &str) -> Result<(), SessionError>;

    /// Checks a file in.
    fn check_in(&self, path: &str, comment: &str, kind: CheckinKind)
        -> Result<(), SessionError>;

    /// Publishes a file (promotes the draft to a major version).
    fn publish(&self, path: &str, comment: &str) -> Result<(), SessionError>;

    /// Approves a file in a moderated library.
    fn approve(&self, path: &str, comment: &str) -> Result<(), SessionError>;
}

/// Opens sessions and owns the connection lifecycle.
pub trait SessionProvider {
    /// Opens a session scope; dropping the returned session closes it.
    fn open_session(&self, log: &dyn UpgradeLog) -> Result<Box<dyn Session>, SessionError>;

    /// Account name, when the provider has credentials to share.
    ///
    /// Consumed only by script-based migration providers, which forward
    /// credentials into the spawned script host.
    fn user_name(&self) -> Option<&str> {
        None
    }

    /// Password matching [`SessionProvider::user_name`].
    fn password(&self) -> Option<&str> {
        None
    }
}
