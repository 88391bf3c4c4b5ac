//! Journals: the persisted ledger of applied migrations.
//!
//! [`PropertyJournal`] keeps one metadata entry per applied migration under a
//! key prefix (`prefix + id`, e.g. `tidemark/migrations/3`). Reading the
//! journal also initializes the id cursor; writing before reading is a
//! programming error and fails fast rather than silently assigning id 0.

use std::cell::Cell;

use chrono::Utc;

use tidemark_core::{Session, UpgradeLog};

use crate::error::JournalError;
use crate::migration::Migration;
use crate::types::MigrationRecord;

/// Key prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "tidemark/migrations/";

/// Persisted ledger of which migrations have run.
pub trait Journal {
    /// Reads every record under the journal's namespace.
    ///
    /// Must run at least once before [`Journal::store_executed_migration`];
    /// it initializes the cursor used for id allocation.
    fn executed_migrations(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
    ) -> Result<Vec<MigrationRecord>, JournalError>;

    /// Records one applied migration, allocating the next id.
    fn store_executed_migration(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        migration: &dyn Migration,
    ) -> Result<MigrationRecord, JournalError>;
}

/// Journal backed by the session's metadata store.
///
/// Corrupt entries degrade instead of failing the read: a value that does not
/// parse falls back to a minimal record built from the key's numeric suffix,
/// and a key with no usable suffix is skipped; both are logged as warnings.
pub struct PropertyJournal {
    prefix: String,
    last_id: Cell<Option<u64>>,
}

impl PropertyJournal {
    /// Journal under [`DEFAULT_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Journal under a custom key prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_id: Cell::new(None),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for PropertyJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal for PropertyJournal {
    fn executed_migrations(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
    ) -> Result<Vec<MigrationRecord>, JournalError> {
        let properties = session.properties()?;
        let mut last_id = 0u64;
        let mut records = Vec::new();

        for (key, value) in properties.iter().filter(|(key, _)| key.starts_with(&self.prefix)) {
            match serde_json::from_str::<MigrationRecord>(value) {
                Ok(record) => {
                    log.verbose(&format!("Read migration record '{key}'"));
                    last_id = last_id.max(record.id);
                    records.push(record);
                }
                Err(_) => {
                    let suffix = &key[self.prefix.len()..];
                    match suffix.parse::<u64>() {
                        Ok(id) if id > 0 => {
                            log.warning(&format!(
                                "Defaulting to key value '{id}' (id and name) for '{key}', \
                                 the stored record could not be parsed"
                            ));
                            last_id = last_id.max(id);
                            records.push(MigrationRecord::fallback(id));
                        }
                        _ => {
                            log.warning(&format!(
                                "Skipping journal key '{key}', the trailing id could not be \
                                 parsed; continuing"
                            ));
                        }
                    }
                }
            }
        }

        self.last_id.set(Some(last_id));
        Ok(records)
    }

    fn store_executed_migration(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        migration: &dyn Migration,
    ) -> Result<MigrationRecord, JournalError> {
        let last_id = self.last_id.get().ok_or(JournalError::StoreBeforeGet)?;
        let id = last_id + 1;

        let record = MigrationRecord {
            id,
            name: migration.name().to_string(),
            note: migration.note(),
            applied_at: Utc::now(),
        };
        let key = format!("{}{}", self.prefix, id);
        let json =
            serde_json::to_string(&record).map_err(|source| JournalError::Serialize {
                name: record.name.clone(),
                source,
            })?;

        log.verbose(&format!("Storing migration record under '{key}'"));
        session.set_property(&key, &json)?;
        self.last_id.set(Some(id));
        Ok(record)
    }
}

/// Journal that never persists anything.
///
/// Reads empty and acknowledges stores with an id-0 record, so every
/// available migration runs on every invocation. Opt-in, for targets where
/// re-running is the point.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullJournal;

impl Journal for NullJournal {
    fn executed_migrations(
        &self,
        _session: &dyn Session,
        _log: &dyn UpgradeLog,
    ) -> Result<Vec<MigrationRecord>, JournalError> {
        Ok(Vec::new())
    }

    fn store_executed_migration(
        &self,
        _session: &dyn Session,
        log: &dyn UpgradeLog,
        migration: &dyn Migration,
    ) -> Result<MigrationRecord, JournalError> {
        log.verbose(&format!(
            "Null journal: migration '{}' not recorded",
            migration.name()
        ));
        Ok(MigrationRecord {
            id: 0,
            name: migration.name().to_string(),
            note: migration.note(),
            applied_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApplyError;
    use tidemark_core::{log::NullLog, MemoryRepository, Session};

    struct Noop(&'static str);

    impl Migration for Noop {
        fn name(&self) -> &str {
            self.0
        }

        fn apply(&self, _: &dyn Session, _: &dyn UpgradeLog) -> Result<(), ApplyError> {
            Ok(())
        }
    }

    #[test]
    fn store_before_get_fails_fast() {
        let repo = MemoryRepository::new();
        let journal = PropertyJournal::new();
        let err = journal
            .store_executed_migration(&repo, &NullLog, &Noop("m1"))
            .unwrap_err();
        assert!(matches!(err, JournalError::StoreBeforeGet), "got: {err}");
    }

    #[test]
    fn ids_start_at_one_and_advance() {
        let repo = MemoryRepository::new();
        let journal = PropertyJournal::new();
        assert!(journal
            .executed_migrations(&repo, &NullLog)
            .expect("read")
            .is_empty());

        let first = journal
            .store_executed_migration(&repo, &NullLog, &Noop("m1"))
            .expect("store");
        let second = journal
            .store_executed_migration(&repo, &NullLog, &Noop("m2"))
            .expect("store");
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let stored = repo
            .stored_property("tidemark/migrations/1")
            .expect("persisted");
        let parsed: MigrationRecord = serde_json::from_str(&stored).expect("json");
        assert_eq!(parsed.name, "m1");
    }

    #[test]
    fn cursor_continues_from_highest_stored_id() {
        let repo = MemoryRepository::new();
        let journal = PropertyJournal::new();
        for id in [3u64, 7] {
            let record = MigrationRecord {
                id,
                name: format!("m{id}"),
                note: None,
                applied_at: Utc::now(),
            };
            repo.set_property(
                &format!("tidemark/migrations/{id}"),
                &serde_json::to_string(&record).expect("json"),
            )
            .expect("seed");
        }

        let records = journal.executed_migrations(&repo, &NullLog).expect("read");
        assert_eq!(records.len(), 2);
        let next = journal
            .store_executed_migration(&repo, &NullLog, &Noop("m8"))
            .expect("store");
        assert_eq!(next.id, 8);
    }

    #[test]
    fn null_journal_reads_empty_and_does_not_persist() {
        let repo = MemoryRepository::new();
        let journal = NullJournal;
        assert!(journal
            .executed_migrations(&repo, &NullLog)
            .expect("read")
            .is_empty());

        let record = journal
            .store_executed_migration(&repo, &NullLog, &Noop("m1"))
            .expect("store");
        assert_eq!(record.id, 0);
        assert!(repo.properties().expect("props").is_empty());
    }
}
