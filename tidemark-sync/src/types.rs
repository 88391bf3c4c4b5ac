//! Synchronization outcomes.

use std::path::PathBuf;

use crate::error::SyncError;

/// One file considered by a synchronization run.
///
/// `hash` is the fingerprint of the *preprocessed* content, whether or not
/// the file was uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    /// Local source path.
    pub file_path: PathBuf,
    /// Server-relative destination path.
    pub destination: String,
    /// True when the content differed and was uploaded.
    pub changed: bool,
    /// Hash of the preprocessed content.
    pub hash: Vec<u8>,
}

/// Aggregate outcome of one folder synchronization.
///
/// Accumulates partial progress: on failure, `files` still holds every file
/// processed before the run stopped.
#[derive(Debug)]
pub struct SynchronizationResult {
    pub files: Vec<UploadInfo>,
    pub successful: bool,
    pub error: Option<SyncError>,
}

impl SynchronizationResult {
    pub(crate) fn success(files: Vec<UploadInfo>) -> Self {
        Self {
            files,
            successful: true,
            error: None,
        }
    }

    pub(crate) fn failure(files: Vec<UploadInfo>, error: SyncError) -> Self {
        Self {
            files,
            successful: false,
            error: Some(error),
        }
    }
}
