//! The migration engine.
//!
//! One run: validate configuration, open a session scope, diff available
//! migrations against the journal, apply the remainder in order, record each
//! success immediately. The run is linear; the first failure stops it and
//! the result carries whatever was applied and journaled up to that point.

use tidemark_core::{Session, SessionProvider, TraceLog, UpgradeLog};

use crate::error::{ConfigError, MigrateError};
use crate::journal::{Journal, PropertyJournal};
use crate::provider::MigrationProvider;
use crate::types::{MigrationRecord, MigrationResult};

const PARTIAL_FAILURE: &str = "Migration failed and the target has been left in a partially \
                               complete state, manual intervention may be required.";

/// Configuration for a [`Migrator`].
///
/// Log and journal have working defaults (trace log, property journal);
/// providers and the session provider must be supplied.
pub struct MigratorConfig {
    pub log: Box<dyn UpgradeLog>,
    pub journal: Box<dyn Journal>,
    pub providers: Vec<Box<dyn MigrationProvider>>,
    pub session_provider: Option<Box<dyn SessionProvider>>,
}

impl MigratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures all expectations on this configuration are met.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }
        if self.session_provider.is_none() {
            return Err(ConfigError::NoSessionProvider);
        }
        Ok(())
    }
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            log: Box::new(TraceLog),
            journal: Box::new(PropertyJournal::new()),
            providers: Vec::new(),
            session_provider: None,
        }
    }
}

/// Applies pending migrations to the target.
pub struct Migrator {
    config: MigratorConfig,
}

impl Migrator {
    pub fn new(config: MigratorConfig) -> Self {
        Self { config }
    }

    /// Runs all pending migrations.
    ///
    /// Returns `Err` only when the configuration is invalid, before any
    /// remote call. Every later failure (session open, provider, apply,
    /// journal) is caught here and reported through the result's
    /// `successful` / `error` fields, with partial progress preserved.
    pub fn run(&self) -> Result<MigrationResult, ConfigError> {
        self.config.validate()?;
        let log = self.config.log.as_ref();
        let provider = match &self.config.session_provider {
            Some(provider) => provider,
            None => return Err(ConfigError::NoSessionProvider),
        };

        // Session scope: the boxed session closes when it drops, on every
        // path out of this function.
        let session = match provider.open_session(log) {
            Ok(session) => session,
            Err(source) => {
                log.critical(PARTIAL_FAILURE);
                return Ok(MigrationResult::failure(Vec::new(), source.into()));
            }
        };

        let mut records = Vec::new();
        match self.apply_pending(session.as_ref(), log, &mut records) {
            Ok(()) => Ok(MigrationResult::success(records)),
            Err(error) => {
                log.critical(PARTIAL_FAILURE);
                Ok(MigrationResult::failure(records, error))
            }
        }
    }

    fn apply_pending(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        records: &mut Vec<MigrationRecord>,
    ) -> Result<(), MigrateError> {
        let mut available = Vec::new();
        for provider in &self.config.providers {
            available.extend(provider.migrations(session, log)?);
        }

        let applied = self
            .config
            .journal
            .executed_migrations(session, log)?;

        let to_run: Vec<_> = available
            .into_iter()
            .filter(|migration| {
                !applied
                    .iter()
                    .any(|record| names_match(&record.name, migration.name()))
            })
            .collect();

        if to_run.is_empty() {
            log.info("The target is up to date, there are no migrations to run.");
            return Ok(());
        }

        for migration in to_run {
            log.info(&format!("== Applying migration '{}' ==", migration.name()));
            migration
                .apply(session, log)
                .map_err(|source| MigrateError::Apply {
                    name: migration.name().to_string(),
                    source,
                })?;
            let record =
                self.config
                    .journal
                    .store_executed_migration(session, log, migration.as_ref())?;
            log.verbose(&format!(
                "Migration '{}' complete (journal id: {})",
                record.name, record.id
            ));
            records.push(record);
        }

        log.info("Migration run successful");
        Ok(())
    }
}

/// Idempotency comparison: names match case-insensitively.
fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_a_provider() {
        let config = MigratorConfig::new();
        assert!(matches!(config.validate(), Err(ConfigError::NoProviders)));
    }

    #[test]
    fn names_match_ignores_case() {
        assert!(names_match("Create-Fields", "create-fields"));
        assert!(!names_match("a", "b"));
    }
}
