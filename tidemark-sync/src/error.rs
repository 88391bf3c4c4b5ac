//! Error types for tidemark-sync.

use std::path::PathBuf;

use thiserror::Error;

use tidemark_core::SessionError;

/// Configuration problems caught before any remote call.
///
/// The one error [`Synchronizer::synchronize_folder`](crate::Synchronizer)
/// returns as `Err`; everything later lands in the result instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No session provider was set.
    #[error("a session provider is required to reach the target")]
    NoSessionProvider,
}

/// Errors from hash store reads and writes.
#[derive(Debug, Error)]
pub enum HashStoreError {
    /// The metadata store rejected a read or write.
    #[error("hash store error: {0}")]
    Session(#[from] SessionError),

    /// The hash map could not be serialized for storage.
    #[error("failed to serialize the upload hash map: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors raised while preprocessing text content.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// A `$name$` reference had no supplied value.
    #[error("variable '{name}' has no value defined")]
    MissingVariable { name: String },
}

/// Any failure captured in a synchronization result.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A remote operation failed.
    #[error("session failure: {0}")]
    Session(#[from] SessionError),

    /// The hash store failed while reading or recording.
    #[error("hash store failure: {0}")]
    HashStore(#[from] HashStoreError),

    /// A preprocessor rejected the file's content.
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    /// Folder creation would climb above the web root.
    #[error("cannot create a folder above the web root (web root: {web_path}, folder: {path})")]
    AboveWebRoot { path: String, web_path: String },

    /// The destination path has no parent folder component.
    #[error("invalid destination path: {path}")]
    InvalidDestination { path: String },

    /// A local file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local source folder could not be enumerated.
    #[error("failed to scan source folder {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
