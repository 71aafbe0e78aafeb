//! Deploy intent queue: the handoff records the trigger writes for the
//! rollout side to consume.

use crate::layout::StoreLayout;
use crate::lock::StoreLock;
use crate::{fsync_dir, StoreError};
use caravel_schema::AppId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::info;

/// A request to roll out one sequence of one application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployIntent {
    pub app_id: AppId,
    pub sequence: u64,
    pub requested_at: String,
}

/// File-backed queue of [`DeployIntent`] records under `intents/`.
///
/// Enqueueing overwrites any existing intent for the same (app, sequence):
/// a re-trigger replaces the stale intent rather than queueing behind it.
pub struct IntentQueue {
    layout: StoreLayout,
}

impl IntentQueue {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn enqueue(&self, app_id: &AppId, sequence: u64) -> Result<DeployIntent, StoreError> {
        let intent = DeployIntent {
            app_id: app_id.clone(),
            sequence,
            requested_at: chrono::Utc::now().to_rfc3339(),
        };
        let content = serde_json::to_string_pretty(&intent)?;

        let dir = self.layout.intents_dir();
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.layout.intent_path(app_id.as_str(), sequence))
            .map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;

        info!("queued deploy intent for {app_id} sequence {sequence}");
        Ok(intent)
    }

    /// Remove and return all pending intents, oldest first.
    ///
    /// Takes the store lock so a concurrent enqueue cannot interleave with
    /// the list-then-delete pass.
    pub fn drain(&self) -> Result<Vec<DeployIntent>, StoreError> {
        let _lock = StoreLock::acquire(&self.layout.lock_file())?;

        let dir = self.layout.intents_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut intents = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let content = fs::read_to_string(entry.path())?;
            let intent: DeployIntent = serde_json::from_str(&content)?;
            intents.push(intent);
            fs::remove_file(entry.path())?;
        }
        intents.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
        Ok(intents)
    }

    /// Peek at pending intents without consuming them.
    pub fn pending(&self) -> Result<Vec<DeployIntent>, StoreError> {
        let dir = self.layout.intents_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut intents = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let content = fs::read_to_string(entry.path())?;
            intents.push(serde_json::from_str(&content)?);
        }
        intents.sort_by(|a: &DeployIntent, b| a.requested_at.cmp(&b.requested_at));
        Ok(intents)
    }
}
