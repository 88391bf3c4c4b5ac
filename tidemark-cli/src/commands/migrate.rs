//! `tidemark migrate` — apply pending script migrations to a target.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use tidemark_core::{FsSessionProvider, SessionProvider};
use tidemark_migrate::{
    Migrator, MigratorConfig, NullJournal, ProcessScriptEngine, ScriptMigrationProvider,
};

use crate::console::ConsoleLog;

/// Arguments for `tidemark migrate`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Target root directory.
    pub target: PathBuf,

    /// Folder of migration scripts, applied sorted by file name.
    #[arg(long)]
    pub scripts: PathBuf,

    /// Interpreter the scripts run under.
    #[arg(long, default_value = "/bin/sh")]
    pub shell: PathBuf,

    /// Per-script timeout in seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// User name exported to scripts as `TIDEMARK_USERNAME`.
    #[arg(long, requires = "password")]
    pub username: Option<String>,

    /// Password exported to scripts as `TIDEMARK_PASSWORD`.
    #[arg(long, requires = "username")]
    pub password: Option<String>,

    /// Ignore the journal and re-run every migration.
    #[arg(long)]
    pub force: bool,
}

impl MigrateArgs {
    pub fn run(self, verbose: bool) -> Result<ExitCode> {
        if !self.scripts.is_dir() {
            bail!("scripts folder '{}' does not exist", self.scripts.display());
        }

        let session_provider = match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                FsSessionProvider::new(&self.target).with_credentials(username, password)
            }
            _ => FsSessionProvider::new(&self.target),
        };

        let engine = ProcessScriptEngine::new(&self.shell)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        let mut provider = ScriptMigrationProvider::new(&self.scripts, engine);
        if let (Some(username), Some(password)) =
            (session_provider.user_name(), session_provider.password())
        {
            provider = provider.with_credentials(username, password);
        }

        let mut config = MigratorConfig {
            log: Box::new(ConsoleLog::new(verbose)),
            providers: vec![Box::new(provider)],
            session_provider: Some(Box::new(session_provider)),
            ..MigratorConfig::default()
        };
        if self.force {
            config.journal = Box::new(NullJournal);
        }

        let result = Migrator::new(config).run()?;
        if !result.successful {
            if let Some(error) = &result.error {
                eprintln!("{}", format!("Migration failed: {error}").red());
            }
            return Ok(ExitCode::from(1));
        }

        println!("✓ {} migration(s) applied", result.records.len());
        Ok(ExitCode::SUCCESS)
    }
}
