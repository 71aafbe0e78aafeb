use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Current store format version. Incremented on incompatible layout changes.
pub const STORE_FORMAT_VERSION: u32 = 1;
const VERSION_FILE: &str = "version";

/// Directory layout for the Caravel deployment store.
///
/// Manages paths for application records, per-cluster version history,
/// per-sequence deploy status, the deploy intent queue, and the store
/// version marker. All subdirectories are created lazily on
/// [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreVersion {
    format_version: u32,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn apps_dir(&self) -> PathBuf {
        self.root.join("apps")
    }

    #[inline]
    pub fn app_path(&self, app_id: &str) -> PathBuf {
        self.apps_dir().join(format!("{app_id}.json"))
    }

    #[inline]
    pub fn history_dir(&self, app_id: &str) -> PathBuf {
        self.root.join("history").join(app_id)
    }

    #[inline]
    pub fn history_path(&self, app_id: &str, cluster_id: &str) -> PathBuf {
        self.history_dir(app_id).join(format!("{cluster_id}.json"))
    }

    #[inline]
    pub fn status_dir(&self, app_id: &str, cluster_id: &str) -> PathBuf {
        self.root.join("status").join(app_id).join(cluster_id)
    }

    #[inline]
    pub fn status_path(&self, app_id: &str, cluster_id: &str, sequence: u64) -> PathBuf {
        self.status_dir(app_id, cluster_id)
            .join(format!("{sequence}.json"))
    }

    #[inline]
    pub fn intents_dir(&self) -> PathBuf {
        self.root.join("intents")
    }

    #[inline]
    pub fn intent_path(&self, app_id: &str, sequence: u64) -> PathBuf {
        self.intents_dir().join(format!("{app_id}-{sequence}.json"))
    }

    #[inline]
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".lock")
    }

    /// Create the directory skeleton and version marker, verifying the
    /// format version if the store already exists.
    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.apps_dir())?;
        fs::create_dir_all(self.root.join("history"))?;
        fs::create_dir_all(self.root.join("status"))?;
        fs::create_dir_all(self.intents_dir())?;

        let version_path = self.root.join(VERSION_FILE);
        if version_path.exists() {
            let content = fs::read_to_string(&version_path)?;
            let version: StoreVersion = serde_json::from_str(&content)?;
            if version.format_version != STORE_FORMAT_VERSION {
                return Err(StoreError::VersionMismatch {
                    expected: STORE_FORMAT_VERSION,
                    found: version.format_version,
                });
            }
        } else {
            let version = StoreVersion {
                format_version: STORE_FORMAT_VERSION,
            };
            let content = serde_json::to_string(&version)?;
            let mut tmp = NamedTempFile::new_in(&self.root)?;
            tmp.write_all(content.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&version_path)
                .map_err(|e| StoreError::Io(e.error))?;
        }
        Ok(())
    }
}
