//! # tidemark-migrate
//!
//! Journaled, idempotent migrations against a remote content repository.
//!
//! Build a [`MigratorConfig`] (providers + session provider, defaults for
//! log and journal), hand it to [`Migrator`], and call
//! [`run`](Migrator::run): available migrations are diffed against the
//! journal by case-insensitive name and only the remainder is applied, each
//! success recorded immediately.

pub mod error;
pub mod journal;
pub mod migration;
pub mod migrator;
pub mod provider;
pub mod script;
pub mod types;

pub use error::{ApplyError, ConfigError, JournalError, MigrateError, ProviderError};
pub use journal::{Journal, NullJournal, PropertyJournal};
pub use migration::{FnMigration, Migration};
pub use migrator::{Migrator, MigratorConfig};
pub use provider::{MigrationProvider, MigrationRegistry};
pub use script::{ProcessScriptEngine, ScriptEngine, ScriptError, ScriptMigrationProvider};
pub use types::{MigrationRecord, MigrationResult};
