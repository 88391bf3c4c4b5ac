//! The migration capability and its closure adapter.

use tidemark_core::{Session, UpgradeLog};

use crate::error::ApplyError;

/// One available change.
///
/// `name` is the idempotency key: the engine matches it case-insensitively
/// against journaled records, so a migration renamed after it ran will run
/// again. `note` is an opaque payload persisted alongside the record,
/// commonly a pointer back to where the change lives.
pub trait Migration {
    fn name(&self) -> &str;

    fn note(&self) -> Option<String> {
        None
    }

    /// Applies the change against the session.
    fn apply(&self, session: &dyn Session, log: &dyn UpgradeLog) -> Result<(), ApplyError>;
}

impl std::fmt::Debug for dyn Migration + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration").field("name", &self.name()).finish()
    }
}

/// Adapts a closure into a [`Migration`].
///
/// The unit for registry-based setups: register a name and an apply function,
/// no type per migration required.
pub struct FnMigration<F> {
    name: String,
    note: Option<String>,
    apply: F,
}

impl<F> FnMigration<F>
where
    F: Fn(&dyn Session, &dyn UpgradeLog) -> Result<(), ApplyError>,
{
    pub fn new(name: impl Into<String>, apply: F) -> Self {
        Self {
            name: name.into(),
            note: None,
            apply,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl<F> Migration for FnMigration<F>
where
    F: Fn(&dyn Session, &dyn UpgradeLog) -> Result<(), ApplyError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn note(&self) -> Option<String> {
        self.note.clone()
    }

    fn apply(&self, session: &dyn Session, log: &dyn UpgradeLog) -> Result<(), ApplyError> {
        (self.apply)(session, log)
    }
}
