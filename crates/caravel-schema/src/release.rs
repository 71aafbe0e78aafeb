//! Release sequences, per-cluster deploy status, and version history.

use serde::{Deserialize, Serialize};

/// Recorded state of deploying a given sequence to a given cluster.
///
/// Written by the rollout side; the trigger core only reads it (to gate on
/// `PendingConfig`) and deletes it (to clear stale state before a fresh
/// attempt).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    /// Release is waiting for required configuration; deployment is blocked.
    PendingConfig,
    Deploying,
    Deployed,
    Failed,
    /// No status has been recorded for this sequence.
    Unknown,
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployStatus::PendingConfig => write!(f, "pending_config"),
            DeployStatus::Deploying => write!(f, "deploying"),
            DeployStatus::Deployed => write!(f, "deployed"),
            DeployStatus::Failed => write!(f, "failed"),
            DeployStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One entry in an application's version history for a cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionRecord {
    pub sequence: u64,
    #[serde(default)]
    pub version_label: Option<String>,
    pub created_at: String,
}

/// Ordered view of an application's releases for one cluster: the sequences
/// already superseded versus the current/pending one.
///
/// The trigger core uses this only to classify a requested sequence as
/// "past" (rollback-like) or "current/future".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionHistory {
    #[serde(default)]
    pub current: Option<VersionRecord>,
    #[serde(default)]
    pub past: Vec<VersionRecord>,
}

impl VersionHistory {
    /// True when `sequence` is among the superseded releases.
    pub fn is_past(&self, sequence: u64) -> bool {
        self.past.iter().any(|v| v.sequence == sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sequence: u64) -> VersionRecord {
        VersionRecord {
            sequence,
            version_label: None,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
        }
    }

    #[test]
    fn status_serde_is_snake_case() {
        let json = serde_json::to_string(&DeployStatus::PendingConfig).unwrap();
        assert_eq!(json, "\"pending_config\"");
        let back: DeployStatus = serde_json::from_str("\"deployed\"").unwrap();
        assert_eq!(back, DeployStatus::Deployed);
    }

    #[test]
    fn is_past_matches_only_superseded() {
        let history = VersionHistory {
            current: Some(record(7)),
            past: vec![record(5), record(6)],
        };
        assert!(history.is_past(5));
        assert!(history.is_past(6));
        assert!(!history.is_past(7));
        assert!(!history.is_past(8));
    }

    #[test]
    fn empty_history_has_no_past() {
        let history = VersionHistory::default();
        assert!(!history.is_past(0));
    }
}
