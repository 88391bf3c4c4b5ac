//! Migration providers: where available migrations come from.
//!
//! The engine takes providers in order and flattens what they enumerate.
//! [`MigrationRegistry`] is the in-code source: migrations are registered
//! explicitly (a statically built list, iterated at run time) and enumerated
//! in case-insensitive name order. Script folders are covered by
//! [`ScriptMigrationProvider`](crate::script::ScriptMigrationProvider).

use std::sync::Arc;

use tidemark_core::{Session, UpgradeLog};

use crate::error::ProviderError;
use crate::migration::Migration;

/// Enumerates available migrations.
///
/// Called once per engine run; descriptors are produced fresh each time.
pub trait MigrationProvider {
    fn migrations(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
    ) -> Result<Vec<Arc<dyn Migration>>, ProviderError>;
}

/// Explicit, in-code list of migrations.
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Arc<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one migration.
    pub fn register(&mut self, migration: impl Migration + 'static) -> &mut Self {
        self.migrations.push(Arc::new(migration));
        self
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl MigrationProvider for MigrationRegistry {
    fn migrations(
        &self,
        _session: &dyn Session,
        log: &dyn UpgradeLog,
    ) -> Result<Vec<Arc<dyn Migration>>, ProviderError> {
        let mut available = self.migrations.clone();
        available.sort_by_key(|migration| migration.name().to_lowercase());
        log.verbose(&format!(
            "Registry provides {} migration(s)",
            available.len()
        ));
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApplyError;
    use crate::migration::FnMigration;
    use tidemark_core::{log::NullLog, MemoryRepository};

    fn noop(name: &str) -> FnMigration<impl Fn(&dyn Session, &dyn UpgradeLog) -> Result<(), ApplyError>>
    {
        FnMigration::new(name, |_, _| Ok(()))
    }

    #[test]
    fn registry_orders_by_name_case_insensitively() {
        let repo = MemoryRepository::new();
        let mut registry = MigrationRegistry::new();
        registry.register(noop("b-two"));
        registry.register(noop("A-one"));
        registry.register(noop("c-three"));

        let names: Vec<String> = registry
            .migrations(&repo, &NullLog)
            .expect("enumerate")
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["A-one", "b-two", "c-three"]);
    }
}
