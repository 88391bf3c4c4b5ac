//! Error types for tidemark-migrate.

use std::path::PathBuf;

use thiserror::Error;

use tidemark_core::SessionError;

/// Boxed error from a migration body or script host.
pub type ApplyError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration problems caught before any remote call.
///
/// The one error [`Migrator::run`](crate::Migrator::run) returns as `Err`;
/// everything later lands in the run result instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No migration provider was added.
    #[error("no migration providers were added; add a registry or script provider")]
    NoProviders,

    /// No session provider was set.
    #[error("a session provider is required to reach the target")]
    NoSessionProvider,
}

/// Errors from journal reads and writes.
#[derive(Debug, Error)]
pub enum JournalError {
    /// `store_executed_migration` was called before `executed_migrations`.
    #[error(
        "executed_migrations (to read previous migrations) must run before \
         store_executed_migration (to store new ones)"
    )]
    StoreBeforeGet,

    /// The metadata store rejected a read or write.
    #[error("journal storage error: {0}")]
    Session(#[from] SessionError),

    /// A record could not be serialized for storage.
    #[error("failed to serialize migration record '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from migration providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The script folder could not be enumerated.
    #[error("failed to scan migration scripts at {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure captured in a migration run result.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Opening the session failed before any migration ran.
    #[error("could not open a session: {0}")]
    Session(#[from] SessionError),

    /// A provider failed while enumerating migrations.
    #[error("migration provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The journal failed while reading or recording.
    #[error("journal failure: {0}")]
    Journal(#[from] JournalError),

    /// A migration body failed.
    #[error("migration '{name}' failed: {source}")]
    Apply {
        name: String,
        #[source]
        source: ApplyError,
    },
}
