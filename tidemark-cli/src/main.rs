//! Tidemark — journaled migrations and hash-gated uploads for a target.
//!
//! # Usage
//!
//! ```text
//! tidemark migrate <target> --scripts <dir> [--shell <prog>] [--timeout-secs N]
//!                  [--username U --password P] [--force]
//! tidemark sync <target> <source> <dest> [--publish draft|published]
//!               [--var NAME=VALUE ...] [--substitute-paths] [--no-hash-store]
//! tidemark status <target> [--json]
//! ```
//!
//! Exit codes: 0 on success, 1 when an engine reports a failed run, 2 for
//! usage or configuration errors.

mod commands;
mod console;

use std::fmt;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{migrate::MigrateArgs, status::StatusArgs, sync::SyncArgs};
use tidemark_core::PublishLevel;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tidemark",
    version,
    about = "Apply journaled migrations and hash-gated uploads to a target",
    long_about = None,
)]
struct Cli {
    /// Print per-step engine detail.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending script migrations to a target.
    Migrate(MigrateArgs),

    /// Upload changed files from a local folder into a target folder.
    Sync(SyncArgs),

    /// Show applied migrations and tracked upload hashes.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Shared PublishLevel argument — parsed from CLI strings, converts to core type
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse [`PublishLevel`] from CLI args.
#[derive(Debug, Clone)]
pub struct PublishLevelArg(pub PublishLevel);

impl Default for PublishLevelArg {
    fn default() -> Self {
        Self(PublishLevel::Draft)
    }
}

impl FromStr for PublishLevelArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self(PublishLevel::Draft)),
            "published" => Ok(Self(PublishLevel::Published)),
            other => Err(format!(
                "unknown publish level '{other}'; expected: draft, published"
            )),
        }
    }
}

impl fmt::Display for PublishLevelArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<PublishLevelArg> for PublishLevel {
    fn from(level: PublishLevelArg) -> Self {
        level.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result: Result<ExitCode> = match cli.command {
        Commands::Migrate(args) => args.run(cli.verbose),
        Commands::Sync(args) => args.run(cli.verbose),
        Commands::Status(args) => args.run(cli.verbose),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
