//! Domain types shared across the tidemark crates.
//!
//! Remote paths are server-relative strings (slash-separated, starting at the
//! site collection root); local paths are `PathBuf`. The versioning-workflow
//! types here describe what a remote document library enforces, not what any
//! particular backend happens to support.

use std::fmt;

// ---------------------------------------------------------------------------
// Versioning workflow
// ---------------------------------------------------------------------------

/// Target state for an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishLevel {
    /// Leave the file as a draft.
    Draft,
    /// Publish (and approve, where moderated) after upload.
    Published,
}

impl fmt::Display for PublishLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishLevel::Draft => write!(f, "draft"),
            PublishLevel::Published => write!(f, "published"),
        }
    }
}

/// Kind of check-in performed after an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinKind {
    /// Minor version increment.
    Minor,
    /// Major version increment.
    Major,
}

/// Versioning rules the destination library enforces.
///
/// `None` from [`Session::library_policy`](crate::session::Session) means the
/// destination is not inside a library and no workflow applies at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryPolicy {
    /// Files must be checked out before they can be modified.
    pub force_checkout: bool,
    /// Minor (draft) versions are enabled.
    pub minor_versions: bool,
    /// Content approval (moderation) is required.
    pub moderation: bool,
}

// ---------------------------------------------------------------------------
// Remote object descriptions
// ---------------------------------------------------------------------------

/// State of an existing remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStatus {
    /// The file is currently checked out.
    pub checked_out: bool,
}

/// A remote folder, identified by its server-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub path: String,
}

impl FolderInfo {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for FolderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}
