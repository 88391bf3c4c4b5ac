//! `tidemark sync` — hash-gated upload of a local folder into a target.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use tidemark_core::FsSessionProvider;
use tidemark_sync::{
    NullHashStore, PathTokenPreprocessor, Preprocessor, Synchronizer, SynchronizerConfig,
    VariablePreprocessor,
};

use crate::console::ConsoleLog;
use crate::PublishLevelArg;

/// Arguments for `tidemark sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Target root directory.
    pub target: PathBuf,

    /// Local folder whose files are uploaded.
    pub source: PathBuf,

    /// Destination folder, `~site/`-relative when not prefixed.
    pub destination: String,

    /// Versioning level files are left at after upload.
    #[arg(long, default_value_t)]
    pub publish: PublishLevelArg,

    /// `NAME=VALUE` substitution for `$NAME$` tokens in file content.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Rewrite `~site/` and `~sitecollection/` prefixes in file content.
    #[arg(long)]
    pub substitute_paths: bool,

    /// Upload every file regardless of stored hashes.
    #[arg(long)]
    pub no_hash_store: bool,
}

impl SyncArgs {
    pub fn run(self, verbose: bool) -> Result<ExitCode> {
        let variables = parse_vars(&self.vars)?;

        let mut preprocessors: Vec<Box<dyn Preprocessor>> = Vec::new();
        if self.substitute_paths {
            preprocessors.push(Box::new(PathTokenPreprocessor::new()));
        }
        if !variables.is_empty() {
            preprocessors.push(Box::new(VariablePreprocessor::new(variables)));
        }

        let mut config = SynchronizerConfig {
            log: Box::new(ConsoleLog::new(verbose)),
            preprocessors,
            session_provider: Some(Box::new(FsSessionProvider::new(&self.target))),
            ..SynchronizerConfig::default()
        };
        if self.no_hash_store {
            config.hash_store = Box::new(NullHashStore);
        }

        let destination = normalize_destination(&self.destination);
        let synchronizer = Synchronizer::new(config);

        if let Err(error) = synchronizer.ensure_folder(&destination) {
            eprintln!("{}", format!("Synchronization failed: {error}").red());
            return Ok(ExitCode::from(1));
        }

        let result =
            synchronizer.synchronize_folder(&self.source, &destination, self.publish.into())?;
        if !result.successful {
            if let Some(error) = &result.error {
                eprintln!("{}", format!("Synchronization failed: {error}").red());
            }
            return Ok(ExitCode::from(1));
        }

        let changed = result.files.iter().filter(|file| file.changed).count();
        let unchanged = result.files.len() - changed;
        println!("✓ {changed} uploaded, {unchanged} unchanged");
        Ok(ExitCode::SUCCESS)
    }
}

/// Relative destinations are taken as web-relative.
fn normalize_destination(destination: &str) -> String {
    if destination.starts_with('/') || destination.starts_with('~') {
        destination.to_string()
    } else {
        format!("~site/{destination}")
    }
}

fn parse_vars(vars: &[String]) -> Result<BTreeMap<String, String>> {
    let mut variables = BTreeMap::new();
    for pair in vars {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("invalid --var '{pair}', expected NAME=VALUE");
        };
        if name.is_empty() {
            bail!("invalid --var '{pair}', the name is empty");
        }
        variables.insert(name.to_string(), value.to_string());
    }
    Ok(variables)
}
