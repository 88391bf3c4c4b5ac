//! `tidemark status` — journal and upload-hash visibility for a target.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use tidemark_core::{FsSessionProvider, NullLog, Session, SessionProvider, UpgradeLog};
use tidemark_migrate::{Journal, MigrationRecord, PropertyJournal};
use tidemark_sync::hash_store;

use crate::console::ConsoleLog;

/// Arguments for `tidemark status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Target root directory.
    pub target: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, verbose: bool) -> Result<ExitCode> {
        // JSON mode keeps stdout parseable; journal warnings still reach
        // stderr through the console log otherwise.
        let log: Box<dyn UpgradeLog> = if self.json {
            Box::new(NullLog)
        } else {
            Box::new(ConsoleLog::new(verbose))
        };

        let provider = FsSessionProvider::new(&self.target);
        let session = provider
            .open_session(log.as_ref())
            .context("could not open a session against the target")?;

        let journal = PropertyJournal::new();
        let records = journal
            .executed_migrations(session.as_ref(), log.as_ref())
            .context("could not read the migration journal")?;
        let tracked = tracked_upload_count(session.as_ref())?;

        if self.json {
            print_json(&records, tracked)?;
        } else {
            print_table(&records, tracked);
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    migrations: &'a [MigrationRecord],
    tracked_uploads: usize,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "applied at")]
    applied_at: String,
    #[tabled(rename = "note")]
    note: String,
}

/// Entries in the stored upload-hash map; a corrupt map counts as empty.
fn tracked_upload_count(session: &dyn Session) -> Result<usize> {
    let raw = session
        .property(hash_store::DEFAULT_KEY)
        .context("could not read the upload-hash map")?;
    let Some(raw) = raw else { return Ok(0) };
    let map: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap_or_default();
    Ok(map.len())
}

fn print_json(records: &[MigrationRecord], tracked: usize) -> Result<()> {
    let payload = StatusJson {
        migrations: records,
        tracked_uploads: tracked,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(records: &[MigrationRecord], tracked: usize) {
    println!(
        "Tidemark v{} | {} migration(s) applied | {} tracked upload(s)",
        env!("CARGO_PKG_VERSION"),
        records.len(),
        tracked,
    );

    if records.is_empty() {
        println!("No migrations have been applied.");
        return;
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|record| RecordRow {
            id: record.id,
            name: record.name.clone(),
            applied_at: format_applied_at(record),
            note: record.note.clone().unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Fallback records carry the minimum timestamp; show those as unknown.
fn format_applied_at(record: &MigrationRecord) -> String {
    if record.applied_at == DateTime::<Utc>::MIN_UTC {
        return "unknown".to_string();
    }
    record
        .applied_at
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}
