//! Migration records and run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MigrateError;

/// Persisted proof that one migration ran.
///
/// Stored in the remote metadata store under `prefix + id`; immutable once
/// created, never deleted by this system. The `id` is assigned by the journal
/// at store time and is independent of anything the migration itself carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl MigrationRecord {
    /// Minimal record reconstructed from a numeric key suffix when the stored
    /// value cannot be parsed.
    pub(crate) fn fallback(id: u64) -> Self {
        Self {
            id,
            name: id.to_string(),
            note: None,
            applied_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// Aggregate outcome of one migration run.
///
/// Accumulates partial progress: on failure, `records` still holds every
/// migration that was applied and journaled before the run stopped.
#[derive(Debug)]
pub struct MigrationResult {
    pub records: Vec<MigrationRecord>,
    pub successful: bool,
    pub error: Option<MigrateError>,
}

impl MigrationResult {
    pub(crate) fn success(records: Vec<MigrationRecord>) -> Self {
        Self {
            records,
            successful: true,
            error: None,
        }
    }

    pub(crate) fn failure(records: Vec<MigrationRecord>, error: MigrateError) -> Self {
        Self {
            records,
            successful: false,
            error: Some(error),
        }
    }
}
