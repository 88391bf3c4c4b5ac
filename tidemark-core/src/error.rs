//! Error types for tidemark-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors a [`Session`](crate::session::Session) operation can raise.
///
/// `NotFound` is special: folder-ensure and file existence checks treat it as
/// a recoverable signal rather than a failure, so callers match on it via
/// [`SessionError::is_not_found`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The remote object (folder, file, or library) does not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata store held a value that could not be parsed.
    #[error("invalid metadata under key '{key}': {source}")]
    Metadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other failure reported by the remote repository.
    #[error("remote operation failed: {message}")]
    Operation { message: String },
}

impl SessionError {
    /// True when the error is the not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }

    /// Constructor for [`SessionError::Operation`].
    pub fn operation(message: impl Into<String>) -> SessionError {
        SessionError::Operation {
            message: message.into(),
        }
    }
}

/// Convenience constructor for [`SessionError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.into(),
        source,
    }
}
