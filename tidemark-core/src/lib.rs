//! Tidemark core library — session boundary, logging, paths, backends.
//!
//! Public API surface:
//! - [`session`] — [`Session`] / [`SessionProvider`] traits
//! - [`log`] — [`UpgradeLog`] and the trace/null sinks
//! - [`types`] — versioning-workflow and remote-object types
//! - [`path`] — server-relative path rules and prefix tokens
//! - [`error`] — [`SessionError`]
//! - [`memory`] / [`fs`] — in-memory and local-directory backends

pub mod error;
pub mod fs;
pub mod log;
pub mod memory;
pub mod path;
pub mod session;
pub mod types;

pub use error::SessionError;
pub use fs::{FsRepository, FsSessionProvider};
pub use log::{NullLog, TraceLog, UpgradeLog};
pub use memory::MemoryRepository;
pub use session::{Session, SessionProvider};
pub use types::{CheckinKind, FileStatus, FolderInfo, LibraryPolicy, PublishLevel};
