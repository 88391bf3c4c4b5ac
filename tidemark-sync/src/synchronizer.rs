//! The synchronization engine.
//!
//! Uploads the files of a local folder into a remote folder, gated per file
//! by a SHA-256 hash of the preprocessed content. Unchanged files are
//! skipped without any remote write; changed files go through the
//! destination library's checkout, checkin, publish and approval workflow
//! as its policy demands, then have their new hash recorded.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use tidemark_core::{
    path, CheckinKind, FolderInfo, LibraryPolicy, PublishLevel, Session, SessionProvider,
    TraceLog, UpgradeLog,
};

use crate::error::{ConfigError, SyncError};
use crate::hash_store::{HashStore, PropertyHashStore};
use crate::preprocess::{preprocess, Preprocessor};
use crate::types::{SynchronizationResult, UploadInfo};

const PARTIAL_FAILURE: &str = "Synchronization failed and the target has been left in a \
                               partially complete state, manual intervention may be required.";

/// Configuration for a [`Synchronizer`].
///
/// Log and hash store have working defaults (trace log, property hash
/// store); the session provider must be supplied. Preprocessors run in the
/// order they are pushed.
pub struct SynchronizerConfig {
    pub log: Box<dyn UpgradeLog>,
    pub hash_store: Box<dyn HashStore>,
    pub preprocessors: Vec<Box<dyn Preprocessor>>,
    pub session_provider: Option<Box<dyn SessionProvider>>,
}

impl SynchronizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures all expectations on this configuration are met.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_provider.is_none() {
            return Err(ConfigError::NoSessionProvider);
        }
        Ok(())
    }
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            log: Box::new(TraceLog),
            hash_store: Box::new(PropertyHashStore::new()),
            preprocessors: Vec::new(),
            session_provider: None,
        }
    }
}

/// Synchronizes local files into the target, based on stored hashes.
pub struct Synchronizer {
    config: SynchronizerConfig,
}

impl Synchronizer {
    pub fn new(config: SynchronizerConfig) -> Self {
        Self { config }
    }

    /// Uploads every changed file of `source` into the destination folder.
    ///
    /// The destination may use a `~site/` or `~sitecollection/` prefix and
    /// must already exist (see [`Synchronizer::ensure_folder`]). Enumeration
    /// is non-recursive and name-sorted. Returns `Err` only when the
    /// configuration is invalid; every later failure is caught here and
    /// reported through the result, which keeps the files processed before
    /// the failure.
    pub fn synchronize_folder(
        &self,
        source: &Path,
        destination: &str,
        level: PublishLevel,
    ) -> Result<SynchronizationResult, ConfigError> {
        self.config.validate()?;
        let provider = self.session_provider()?;
        let log = self.config.log.as_ref();

        let mut files = Vec::new();
        match self.synchronize_into(provider, log, source, destination, level, &mut files) {
            Ok(()) => Ok(SynchronizationResult::success(files)),
            Err(error) => {
                log.error(PARTIAL_FAILURE);
                Ok(SynchronizationResult::failure(files, error))
            }
        }
    }

    /// Uploads one local file into an existing destination folder.
    ///
    /// Same hash gate and workflow as a folder run, but errors propagate
    /// directly instead of being folded into a result aggregate.
    pub fn upload_file(
        &self,
        source: &Path,
        destination_folder: &str,
        level: PublishLevel,
    ) -> Result<UploadInfo, SyncError> {
        self.config.validate()?;
        let provider = self.session_provider()?;
        let log = self.config.log.as_ref();
        let session = provider.open_session(log)?;
        let session = session.as_ref();

        let name = match source.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                return Err(SyncError::Read {
                    path: source.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "source has no file name",
                    ),
                })
            }
        };
        let folder_path = path::resolve(
            destination_folder,
            session.site_path(),
            session.web_path(),
        );
        let destination_path = path::combine(&folder_path, &name);
        self.upload_one(session, log, source, &destination_path, level)
    }

    /// Ensures the folder exists, creating every missing level.
    ///
    /// Refuses to create anything above the session's web root.
    pub fn ensure_folder(&self, folder: &str) -> Result<FolderInfo, SyncError> {
        self.config.validate()?;
        let provider = self.session_provider()?;
        let log = self.config.log.as_ref();
        let session = provider.open_session(log)?;
        self.ensure_folder_in(session.as_ref(), log, folder)
    }

    fn session_provider(&self) -> Result<&dyn SessionProvider, ConfigError> {
        match &self.config.session_provider {
            Some(provider) => Ok(provider.as_ref()),
            None => Err(ConfigError::NoSessionProvider),
        }
    }

    fn synchronize_into(
        &self,
        provider: &dyn SessionProvider,
        log: &dyn UpgradeLog,
        source: &Path,
        destination: &str,
        level: PublishLevel,
        files: &mut Vec<UploadInfo>,
    ) -> Result<(), SyncError> {
        // Session scope: the boxed session closes when it drops, on every
        // path out of this function.
        let session = provider.open_session(log)?;
        let session = session.as_ref();

        log.info(&format!("Uploading folder '{destination}'"));
        let folder_path = path::resolve(destination, session.site_path(), session.web_path());

        for file_path in sorted_files(source)? {
            let Some(name) = file_path.file_name() else {
                continue;
            };
            let destination_path = path::combine(&folder_path, &name.to_string_lossy());
            let info = self.upload_one(session, log, &file_path, &destination_path, level)?;
            files.push(info);
        }
        Ok(())
    }

    /// The per-file algorithm: preprocess, hash, compare, and upload through
    /// the destination's workflow when the content differs.
    fn upload_one(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        source: &Path,
        destination_path: &str,
        level: PublishLevel,
    ) -> Result<UploadInfo, SyncError> {
        let raw = fs::read(source).map_err(|err| SyncError::Read {
            path: source.to_path_buf(),
            source: err,
        })?;
        let content = preprocess(session, log, &self.config.preprocessors, raw)?;
        let hash = Sha256::digest(&content).to_vec();

        let stored = self
            .config
            .hash_store
            .file_hash(session, log, destination_path)?;
        if stored == hash {
            log.info(&format!(
                "{} : no change ({}..).",
                destination_path,
                hash_prefix(&hash)
            ));
            return Ok(UploadInfo {
                file_path: source.to_path_buf(),
                destination: destination_path.to_string(),
                changed: false,
                hash,
            });
        }

        let Some((folder_path, name)) = path::parent_and_name(destination_path) else {
            return Err(SyncError::InvalidDestination {
                path: destination_path.to_string(),
            });
        };
        let policy = self.library_policy_or_default(session, destination_path)?;

        // An existing file in a checkout-enforcing library must be checked
        // out before it can be overwritten.
        if policy.force_checkout {
            match session.file_status(destination_path) {
                Ok(status) if !status.checked_out => {
                    log.info(&format!("Checking out file '{destination_path}'"));
                    session.check_out(destination_path)?;
                }
                Ok(_) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }

        log.info(&format!(
            "{} : updating ({}..)",
            destination_path,
            hash_prefix(&hash)
        ));
        session.upload_file(folder_path, name, &content)?;

        let ended_checked_out = match session.file_status(destination_path) {
            Ok(status) => status.checked_out,
            Err(err) if err.is_not_found() => false,
            Err(err) => return Err(err.into()),
        };
        if ended_checked_out || policy.force_checkout {
            let kind = if policy.minor_versions {
                CheckinKind::Minor
            } else {
                CheckinKind::Major
            };
            log.info(&format!("Checking in file '{name}'"));
            session.check_in(destination_path, "Checked in by provisioning", kind)?;
        }
        if level == PublishLevel::Published {
            if policy.minor_versions {
                log.info(&format!("Publishing file '{name}'"));
                session.publish(destination_path, "Published by provisioning")?;
            }
            if policy.moderation {
                log.info(&format!("Approving file '{name}'"));
                session.approve(destination_path, "Approved by provisioning")?;
            }
        }

        self.config
            .hash_store
            .store_file_hash(session, log, destination_path, &hash)?;
        Ok(UploadInfo {
            file_path: source.to_path_buf(),
            destination: destination_path.to_string(),
            changed: true,
            hash,
        })
    }

    /// A destination outside any library, and a not-found answer, both mean
    /// no workflow applies.
    fn library_policy_or_default(
        &self,
        session: &dyn Session,
        destination_path: &str,
    ) -> Result<LibraryPolicy, SyncError> {
        match session.library_policy(destination_path) {
            Ok(policy) => Ok(policy.unwrap_or_default()),
            Err(err) if err.is_not_found() => Ok(LibraryPolicy::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn ensure_folder_in(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        folder: &str,
    ) -> Result<FolderInfo, SyncError> {
        let folder_path = path::resolve(folder, session.site_path(), session.web_path());
        log.info(&format!(
            "Ensuring folder '{folder_path}' exists, creating if necessary"
        ));

        if !path::is_under(&folder_path, session.web_path()) {
            return Err(SyncError::AboveWebRoot {
                path: folder_path,
                web_path: session.web_path().to_string(),
            });
        }

        match session.get_folder(&folder_path) {
            Ok(folder) => Ok(folder),
            Err(err) if err.is_not_found() => match path::parent_and_name(&folder_path) {
                Some((parent, name)) => {
                    let parent = self.ensure_folder_in(session, log, parent)?;
                    log.info(&format!(
                        "Creating folder '{}' under parent '{}'",
                        name, parent.path
                    ));
                    Ok(session.create_folder(&parent.path, name)?)
                }
                // The web root itself is missing; nothing to create under.
                None => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        }
    }
}

/// Short hex prefix of a hash, for log lines.
fn hash_prefix(hash: &[u8]) -> String {
    hex::encode(&hash[..hash.len().min(4)])
}

/// Non-recursive, name-sorted enumeration of the files in `source`.
fn sorted_files(source: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let scan_err = |err: std::io::Error| SyncError::Scan {
        path: source.to_path_buf(),
        source: err,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(source).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        let entry_path = entry.path();
        if entry_path.is_file() {
            paths.push(entry_path);
        }
    }
    paths.sort();
    Ok(paths)
}
