//! Migration engine integration tests: idempotency, ordering, partial
//! failure, and the configuration/failure boundary.

use std::sync::{Arc, Mutex};

use tidemark_core::{
    log::UpgradeLog, MemoryRepository, Session, SessionError, SessionProvider,
};
use tidemark_migrate::{
    ConfigError, FnMigration, MigrateError, MigrationRegistry, Migrator, MigratorConfig,
    NullJournal,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Log sink that keeps every message for assertions.
#[derive(Clone, Default)]
struct CaptureLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CaptureLog {
    fn contains(&self, needle: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains(needle))
    }
}

impl UpgradeLog for CaptureLog {
    fn verbose(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
    fn warning(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
    fn critical(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

type Applied = Arc<Mutex<Vec<String>>>;

/// Registry whose migrations record their application order into `applied`.
fn registry_of(names: &[&str], applied: &Applied) -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    for name in names {
        let name = name.to_string();
        let applied = Arc::clone(applied);
        let recorded = name.clone();
        registry.register(FnMigration::new(name, move |_, _| {
            applied.lock().unwrap().push(recorded.clone());
            Ok(())
        }));
    }
    registry
}

fn config_for(repo: &MemoryRepository, registry: MigrationRegistry) -> MigratorConfig {
    MigratorConfig {
        providers: vec![Box::new(registry)],
        session_provider: Some(Box::new(repo.clone())),
        ..MigratorConfig::default()
    }
}

// ---------------------------------------------------------------------------
// 1. Ordering and recording
// ---------------------------------------------------------------------------

#[test]
fn registry_runs_in_name_order_with_sequential_ids() {
    let repo = MemoryRepository::new();
    let applied: Applied = Arc::default();
    let result = Migrator::new(config_for(&repo, registry_of(&["B", "A", "C"], &applied)))
        .run()
        .expect("valid config");

    assert!(result.successful);
    assert_eq!(*applied.lock().unwrap(), vec!["A", "B", "C"]);
    let ids: Vec<u64> = result.records.iter().map(|r| r.id).collect();
    let names: Vec<&str> = result.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn provider_order_is_preserved_across_providers() {
    let repo = MemoryRepository::new();
    let applied: Applied = Arc::default();
    let config = MigratorConfig {
        providers: vec![
            Box::new(registry_of(&["zz-from-first"], &applied)),
            Box::new(registry_of(&["aa-from-second"], &applied)),
        ],
        session_provider: Some(Box::new(repo.clone())),
        ..MigratorConfig::default()
    };

    let result = Migrator::new(config).run().expect("valid config");
    assert!(result.successful);
    // First provider's migrations run first even though the second sorts earlier.
    assert_eq!(
        *applied.lock().unwrap(),
        vec!["zz-from-first", "aa-from-second"]
    );
}

// ---------------------------------------------------------------------------
// 2. Idempotency
// ---------------------------------------------------------------------------

#[test]
fn second_run_applies_nothing_new() {
    let repo = MemoryRepository::new();
    let applied: Applied = Arc::default();

    let first = Migrator::new(config_for(&repo, registry_of(&["one", "two"], &applied)))
        .run()
        .expect("valid config");
    assert_eq!(first.records.len(), 2);

    let log = CaptureLog::default();
    let mut config = config_for(&repo, registry_of(&["one", "two"], &applied));
    config.log = Box::new(log.clone());
    let second = Migrator::new(config).run().expect("valid config");

    assert!(second.successful);
    assert!(second.records.is_empty(), "second run must record nothing");
    assert_eq!(applied.lock().unwrap().len(), 2, "no re-application");
    assert!(log.contains("up to date"));
}

#[test]
fn applied_matching_is_case_insensitive() {
    let repo = MemoryRepository::new();
    let applied: Applied = Arc::default();

    Migrator::new(config_for(&repo, registry_of(&["Create-Fields"], &applied)))
        .run()
        .expect("valid config");

    // Same migration, different casing: must be treated as already applied.
    let result = Migrator::new(config_for(&repo, registry_of(&["CREATE-FIELDS"], &applied)))
        .run()
        .expect("valid config");
    assert!(result.successful);
    assert!(result.records.is_empty());
    assert_eq!(applied.lock().unwrap().len(), 1);
}

#[test]
fn null_journal_reapplies_every_run() {
    let repo = MemoryRepository::new();
    let applied: Applied = Arc::default();

    for _ in 0..2 {
        let mut config = config_for(&repo, registry_of(&["always"], &applied));
        config.journal = Box::new(NullJournal);
        let result = Migrator::new(config).run().expect("valid config");
        assert!(result.successful);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].id, 0);
    }
    assert_eq!(applied.lock().unwrap().len(), 2);
    assert!(repo.properties().expect("props").is_empty(), "nothing persisted");
}

// ---------------------------------------------------------------------------
// 3. Failure handling
// ---------------------------------------------------------------------------

#[test]
fn failure_stops_the_run_and_keeps_partial_records() {
    let repo = MemoryRepository::new();
    let applied: Applied = Arc::default();

    let mut registry = MigrationRegistry::new();
    for name in ["m1", "m2", "m4", "m5"] {
        let applied = Arc::clone(&applied);
        let recorded = name.to_string();
        registry.register(FnMigration::new(name, move |_, _| {
            applied.lock().unwrap().push(recorded.clone());
            Ok(())
        }));
    }
    registry.register(FnMigration::new("m3", |_, _| Err("exploding migration".into())));

    let log = CaptureLog::default();
    let mut config = config_for(&repo, registry);
    config.log = Box::new(log.clone());
    let result = Migrator::new(config).run().expect("valid config");

    assert!(!result.successful);
    assert_eq!(result.records.len(), 2, "m1 and m2 were recorded");
    assert_eq!(*applied.lock().unwrap(), vec!["m1", "m2"]);
    match result.error {
        Some(MigrateError::Apply { ref name, .. }) => assert_eq!(name, "m3"),
        ref other => panic!("expected apply failure, got {other:?}"),
    }
    assert!(log.contains("manual intervention may be required"));

    // The journal still knows about the two applied migrations.
    let rerun_applied: Applied = Arc::default();
    let rerun = Migrator::new(config_for(
        &repo,
        registry_of(&["m1", "m2", "m4"], &rerun_applied),
    ))
    .run()
    .expect("valid config");
    assert!(rerun.successful);
    assert_eq!(rerun.records.len(), 1);
    assert_eq!(rerun.records[0].name, "m4");
}

#[test]
fn session_open_failure_is_a_failed_result_not_err() {
    struct RefusingProvider;

    impl SessionProvider for RefusingProvider {
        fn open_session(
            &self,
            _log: &dyn UpgradeLog,
        ) -> Result<Box<dyn Session>, SessionError> {
            Err(SessionError::operation("connection refused"))
        }
    }

    let applied: Applied = Arc::default();
    let config = MigratorConfig {
        providers: vec![Box::new(registry_of(&["never-runs"], &applied))],
        session_provider: Some(Box::new(RefusingProvider)),
        ..MigratorConfig::default()
    };

    let result = Migrator::new(config).run().expect("config is valid");
    assert!(!result.successful);
    assert!(result.records.is_empty());
    assert!(matches!(result.error, Some(MigrateError::Session(_))));
    assert!(applied.lock().unwrap().is_empty());
}

#[test]
fn missing_providers_is_a_config_error() {
    let repo = MemoryRepository::new();
    let config = MigratorConfig {
        session_provider: Some(Box::new(repo)),
        ..MigratorConfig::default()
    };
    let err = Migrator::new(config).run().unwrap_err();
    assert!(matches!(err, ConfigError::NoProviders));
}

#[test]
fn missing_session_provider_is_a_config_error() {
    let applied: Applied = Arc::default();
    let config = MigratorConfig {
        providers: vec![Box::new(registry_of(&["m"], &applied))],
        ..MigratorConfig::default()
    };
    let err = Migrator::new(config).run().unwrap_err();
    assert!(matches!(err, ConfigError::NoSessionProvider));
}
