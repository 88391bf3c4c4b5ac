//! Tidemark sync — hash-gated file synchronization into a remote target.
//!
//! The [`Synchronizer`] uploads the files of a local folder into a remote
//! folder, skipping files whose preprocessed content already matches the
//! hash recorded by a [`HashStore`]. See the crate modules:
//! - [`synchronizer`] — the engine and its configuration
//! - [`hash_store`] — persisted upload-hash tracking
//! - [`preprocess`] — text transforms applied before hashing and upload
//! - [`types`] — [`UploadInfo`] / [`SynchronizationResult`]
//! - [`error`] — error taxonomy

pub mod error;
pub mod hash_store;
pub mod preprocess;
pub mod synchronizer;
pub mod types;

pub use error::{ConfigError, HashStoreError, PreprocessError, SyncError};
pub use hash_store::{HashStore, NullHashStore, PropertyHashStore};
pub use preprocess::{preprocess, PathTokenPreprocessor, Preprocessor, VariablePreprocessor};
pub use synchronizer::{Synchronizer, SynchronizerConfig};
pub use types::{SynchronizationResult, UploadInfo};
