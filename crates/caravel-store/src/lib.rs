//! Persistence layer for Caravel: applications, downstream clusters,
//! version history, deploy status, and the deploy intent queue.
//!
//! This crate provides the [`Store`] trait consumed by the trigger core,
//! a file-backed [`FsStore`] with atomic JSON record writes and blake3
//! integrity checksums, an in-memory [`MemStore`] with failure injection
//! for tests, and the [`IntentQueue`] handoff surface for the rollout side.

pub mod fs;
pub mod intent;
pub mod layout;
pub mod lock;
pub mod memory;
pub mod traits;

pub use fs::FsStore;
pub use intent::{DeployIntent, IntentQueue};
pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use lock::StoreLock;
pub use memory::{FailPoint, MemStore};
pub use traits::Store;

use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// On Linux with ext4 `data=ordered` (the default), renames are usually
/// durable without an explicit dir fsync, but POSIX does not guarantee this.
/// Calling `fsync()` on the parent directory makes the rename durable on
/// all filesystems and mount configurations.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("application not found: {0}")]
    AppNotFound(String),
    #[error("integrity check failed for record '{record}': expected {expected}, got {actual}")]
    IntegrityFailure {
        record: String,
        expected: String,
        actual: String,
    },
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the error means "the application does not exist", as
    /// opposed to a transient read/write failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::AppNotFound(_))
    }
}
