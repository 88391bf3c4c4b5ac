//! Local-directory [`Session`] backend.
//!
//! Treats a directory tree as the remote target: folders and files are real
//! directories and files, and the metadata store is a JSON map at
//! `.tidemark/properties.json` under the root. The canonical root path
//! doubles as both site collection and web path, so `~site/` and
//! `~sitecollection/` prefixes resolve beneath the root.
//!
//! Layout under the target root:
//!
//! | path                          | contents                      |
//! |-------------------------------|-------------------------------|
//! | `.tidemark/properties.json`   | metadata map (string→string)  |
//! | everything else               | synchronized folders/files    |
//!
//! A plain directory has no document library, so `library_policy` answers
//! `None` and the checkout/checkin/publish/approve workflow never engages;
//! those calls are accepted as no-ops for trait completeness.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SessionError};
use crate::log::UpgradeLog;
use crate::session::{Session, SessionProvider};
use crate::types::{CheckinKind, FileStatus, FolderInfo, LibraryPolicy};

const META_DIR: &str = ".tidemark";
const PROPERTIES_FILE: &str = "properties.json";

/// Session over a local directory.
#[derive(Debug)]
pub struct FsRepository {
    root: PathBuf,
    root_path: String,
}

impl FsRepository {
    /// Opens the directory at `root`; the path must exist.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, SessionError> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SessionError::NotFound {
                path: root.display().to_string(),
            },
            _ => io_err(root, source),
        })?;
        let root_path = root.to_string_lossy().into_owned();
        Ok(Self { root, root_path })
    }

    /// Maps a server-relative path onto the filesystem.
    ///
    /// Paths outside the root are still joined beneath it, never above it.
    fn to_local(&self, server_path: &str) -> PathBuf {
        let relative = crate::path::web_relative(server_path, &self.root_path);
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    fn properties_file(&self) -> PathBuf {
        self.root.join(META_DIR).join(PROPERTIES_FILE)
    }

    fn read_properties(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let file = self.properties_file();
        let raw = match std::fs::read_to_string(&file) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(source) => return Err(io_err(file, source)),
        };
        serde_json::from_str(&raw).map_err(|source| SessionError::Metadata {
            key: file.display().to_string(),
            source,
        })
    }

    /// Write flow: serialize → `.json.tmp` sibling → `rename`.
    fn write_properties(&self, properties: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let file = self.properties_file();
        let dir = self.root.join(META_DIR);
        std::fs::create_dir_all(&dir).map_err(|source| io_err(&dir, source))?;

        let json = serde_json::to_string_pretty(properties).map_err(|source| {
            SessionError::Metadata {
                key: file.display().to_string(),
                source,
            }
        })?;
        let tmp = file.with_file_name(format!("{PROPERTIES_FILE}.tmp"));
        std::fs::write(&tmp, json).map_err(|source| io_err(&tmp, source))?;
        std::fs::rename(&tmp, &file).map_err(|source| io_err(&file, source))?;
        Ok(())
    }
}

impl Session for FsRepository {
    fn site_path(&self) -> &str {
        &self.root_path
    }

    fn web_path(&self) -> &str {
        &self.root_path
    }

    fn properties(&self) -> Result<BTreeMap<String, String>, SessionError> {
        self.read_properties()
    }

    fn set_property(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut properties = self.read_properties()?;
        properties.insert(key.to_string(), value.to_string());
        self.write_properties(&properties)
    }

    fn get_folder(&self, folder_path: &str) -> Result<FolderInfo, SessionError> {
        let local = self.to_local(folder_path);
        match std::fs::metadata(&local) {
            Ok(meta) if meta.is_dir() => Ok(FolderInfo::new(folder_path)),
            Ok(_) => Err(SessionError::operation(format!(
                "'{folder_path}' exists but is not a folder"
            ))),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(SessionError::NotFound {
                    path: folder_path.to_string(),
                })
            }
            Err(source) => Err(io_err(local, source)),
        }
    }

    fn create_folder(&self, parent: &str, name: &str) -> Result<FolderInfo, SessionError> {
        let created = crate::path::combine(parent, name);
        let local = self.to_local(&created);
        match std::fs::create_dir(&local) {
            Ok(()) => Ok(FolderInfo::new(created)),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(SessionError::NotFound {
                    path: parent.to_string(),
                })
            }
            Err(source) if source.kind() == std::io::ErrorKind::AlreadyExists => {
                Ok(FolderInfo::new(created))
            }
            Err(source) => Err(io_err(local, source)),
        }
    }

    fn file_status(&self, file_path: &str) -> Result<FileStatus, SessionError> {
        let local = self.to_local(file_path);
        match std::fs::metadata(&local) {
            Ok(meta) if meta.is_file() => Ok(FileStatus { checked_out: false }),
            Ok(_) => Err(SessionError::operation(format!(
                "'{file_path}' exists but is not a file"
            ))),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(SessionError::NotFound {
                    path: file_path.to_string(),
                })
            }
            Err(source) => Err(io_err(local, source)),
        }
    }

    fn library_policy(&self, _file_path: &str) -> Result<Option<LibraryPolicy>, SessionError> {
        Ok(None)
    }

    fn upload_file(
        &self,
        folder: &str,
        name: &str,
        content: &[u8],
    ) -> Result<String, SessionError> {
        let destination = crate::path::combine(folder, name);
        let local = self.to_local(&destination);
        match std::fs::write(&local, content) {
            Ok(()) => Ok(destination),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(SessionError::NotFound {
                    path: folder.to_string(),
                })
            }
            Err(source) => Err(io_err(local, source)),
        }
    }

    fn check_out(&self, _file_path: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn check_in(
        &self,
        _file_path: &str,
        _comment: &str,
        _kind: CheckinKind,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    fn publish(&self, _file_path: &str, _comment: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn approve(&self, _file_path: &str, _comment: &str) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Opens [`FsRepository`] sessions for one target root.
#[derive(Debug, Clone)]
pub struct FsSessionProvider {
    root: PathBuf,
    user_name: Option<String>,
    password: Option<String>,
}

impl FsSessionProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            user_name: None,
            password: None,
        }
    }

    /// Credentials handed to script-based migration providers.
    pub fn with_credentials(
        mut self,
        user_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user_name = Some(user_name.into());
        self.password = Some(password.into());
        self
    }
}

impl SessionProvider for FsSessionProvider {
    fn open_session(&self, log: &dyn UpgradeLog) -> Result<Box<dyn Session>, SessionError> {
        let repository = FsRepository::open(&self.root)?;
        log.verbose(&format!(
            "Opened session at '{}'",
            repository.web_path()
        ));
        Ok(Box::new(repository))
    }

    fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn property_roundtrip_creates_meta_dir() {
        let dir = TempDir::new().expect("tempdir");
        let repo = FsRepository::open(dir.path()).expect("open");
        repo.set_property("a/key", "value").expect("set");
        assert_eq!(repo.property("a/key").expect("get").as_deref(), Some("value"));
        assert!(dir.path().join(".tidemark/properties.json").exists());
    }

    #[test]
    fn missing_properties_file_reads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let repo = FsRepository::open(dir.path()).expect("open");
        assert!(repo.properties().expect("read").is_empty());
    }

    #[test]
    fn folder_probe_distinguishes_missing_from_present() {
        let dir = TempDir::new().expect("tempdir");
        let repo = FsRepository::open(dir.path()).expect("open");
        let web = repo.web_path().to_string();

        let err = repo.get_folder(&format!("{web}/docs")).unwrap_err();
        assert!(err.is_not_found());

        repo.create_folder(&web, "docs").expect("create");
        repo.get_folder(&format!("{web}/docs")).expect("exists");
    }

    #[test]
    fn upload_into_missing_folder_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let repo = FsRepository::open(dir.path()).expect("open");
        let web = repo.web_path().to_string();
        let err = repo
            .upload_file(&format!("{web}/absent"), "a.txt", b"x")
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
