//! Script-file migrations and the host that runs them.
//!
//! [`ScriptMigrationProvider`] scans a folder (non-recursive) for script
//! files, sorted by file name, and wraps each as a migration named by its
//! file stem. Execution is delegated to a [`ScriptEngine`];
//! [`ProcessScriptEngine`] spawns an interpreter and waits with an explicit
//! timeout, killing the child on expiry.
//!
//! Environment handed to scripts:
//!
//! | variable            | value                                  |
//! |---------------------|----------------------------------------|
//! | `TIDEMARK_SITE`     | site collection root path              |
//! | `TIDEMARK_WEB`      | current web root path                  |
//! | `TIDEMARK_USERNAME` | provider credentials, when configured  |
//! | `TIDEMARK_PASSWORD` | provider credentials, when configured  |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use tidemark_core::{Session, UpgradeLog};

use crate::error::{ApplyError, ProviderError};
use crate::migration::Migration;
use crate::provider::MigrationProvider;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Failures from a script run.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The interpreter could not be started.
    #[error("failed to launch script {path}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed to wait for script {path}: {source}")]
    Wait {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script ran past the configured timeout and was killed.
    #[error("script {path} exceeded the {timeout_secs}s timeout and was killed")]
    Timeout { path: PathBuf, timeout_secs: u64 },

    /// The script exited nonzero (or was terminated by a signal).
    #[error("script {path} failed with exit code {code:?}")]
    ExitStatus { path: PathBuf, code: Option<i32> },
}

/// Runs one script against the target.
pub trait ScriptEngine {
    fn run(
        &self,
        script: &Path,
        env: &BTreeMap<String, String>,
        log: &dyn UpgradeLog,
    ) -> Result<(), ApplyError>;
}

/// Script host backed by a child interpreter process.
///
/// Stdout/stderr are inherited, so script output reaches the caller's
/// terminal directly.
#[derive(Debug, Clone)]
pub struct ProcessScriptEngine {
    program: PathBuf,
    timeout: Duration,
}

impl ProcessScriptEngine {
    /// Engine using the given interpreter and a 300 second timeout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProcessScriptEngine {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl ScriptEngine for ProcessScriptEngine {
    fn run(
        &self,
        script: &Path,
        env: &BTreeMap<String, String>,
        log: &dyn UpgradeLog,
    ) -> Result<(), ApplyError> {
        log.verbose(&format!(
            "Spawning '{}' for script '{}'",
            self.program.display(),
            script.display()
        ));
        let mut child = std::process::Command::new(&self.program)
            .arg(script)
            .envs(env)
            .spawn()
            .map_err(|source| {
                Box::new(ScriptError::Launch {
                    path: script.to_path_buf(),
                    source,
                })
            })?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(Box::new(ScriptError::ExitStatus {
                        path: script.to_path_buf(),
                        code: status.code(),
                    }))
                }
                Ok(None) => {
                    if started.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Box::new(ScriptError::Timeout {
                            path: script.to_path_buf(),
                            timeout_secs: self.timeout.as_secs(),
                        }));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(source) => {
                    return Err(Box::new(ScriptError::Wait {
                        path: script.to_path_buf(),
                        source,
                    }))
                }
            }
        }
    }
}

/// One script file as a migration.
pub struct ScriptMigration {
    path: PathBuf,
    name: String,
    engine: Arc<dyn ScriptEngine>,
    credentials: Option<(String, String)>,
}

impl Migration for ScriptMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn note(&self) -> Option<String> {
        Some(self.path.display().to_string())
    }

    fn apply(&self, session: &dyn Session, log: &dyn UpgradeLog) -> Result<(), ApplyError> {
        let mut env = BTreeMap::new();
        env.insert("TIDEMARK_SITE".to_string(), session.site_path().to_string());
        env.insert("TIDEMARK_WEB".to_string(), session.web_path().to_string());
        if let Some((user_name, password)) = &self.credentials {
            env.insert("TIDEMARK_USERNAME".to_string(), user_name.clone());
            env.insert("TIDEMARK_PASSWORD".to_string(), password.clone());
        }
        self.engine.run(&self.path, &env, log)
    }
}

/// Enumerates a folder of script files as migrations.
pub struct ScriptMigrationProvider {
    folder: PathBuf,
    extension: String,
    engine: Arc<dyn ScriptEngine>,
    credentials: Option<(String, String)>,
}

impl ScriptMigrationProvider {
    /// Provider over `folder`, running `.sh` files with the given engine.
    pub fn new(folder: impl Into<PathBuf>, engine: impl ScriptEngine + 'static) -> Self {
        Self {
            folder: folder.into(),
            extension: "sh".to_string(),
            engine: Arc::new(engine),
            credentials: None,
        }
    }

    /// Changes the file extension filter (without the leading dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Credentials forwarded to every script's environment. Typically copied
    /// from the session provider's accessors.
    pub fn with_credentials(
        mut self,
        user_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((user_name.into(), password.into()));
        self
    }

    fn scan_err(&self, source: std::io::Error) -> ProviderError {
        ProviderError::Scan {
            path: self.folder.clone(),
            source,
        }
    }
}

impl MigrationProvider for ScriptMigrationProvider {
    fn migrations(
        &self,
        _session: &dyn Session,
        log: &dyn UpgradeLog,
    ) -> Result<Vec<Arc<dyn Migration>>, ProviderError> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(&self.folder).map_err(|source| self.scan_err(source))? {
            let entry = entry.map_err(|source| self.scan_err(source))?;
            let path = entry.path();
            let matches_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
                .unwrap_or(false);
            if path.is_file() && matches_extension {
                paths.push(path);
            }
        }
        paths.sort();

        log.verbose(&format!(
            "Found {} script(s) under '{}'",
            paths.len(),
            self.folder.display()
        ));

        let migrations = paths
            .into_iter()
            .map(|path| {
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Arc::new(ScriptMigration {
                    path,
                    name,
                    engine: Arc::clone(&self.engine),
                    credentials: self.credentials.clone(),
                }) as Arc<dyn Migration>
            })
            .collect();
        Ok(migrations)
    }
}
