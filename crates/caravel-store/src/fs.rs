//! File-backed store: one JSON record per application, history, and status
//! entry, written atomically via temp file + rename.

use crate::layout::StoreLayout;
use crate::traits::Store;
use crate::{fsync_dir, StoreError};
use caravel_schema::{
    AppId, AppSlug, Application, AutoDeployPolicy, ClusterId, DeployStatus, DownstreamCluster,
    VersionHistory,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Persisted application record: the application plus an embedded blake3
/// checksum verified on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppRecord {
    #[serde(flatten)]
    app: Application,
    /// blake3 checksum for integrity verification. `None` for legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
}

impl AppRecord {
    /// Compute the checksum over the record content (excluding the checksum
    /// field itself).
    fn compute_checksum(&self) -> Result<String, StoreError> {
        let mut copy = self.clone();
        copy.checksum = None;
        let json = serde_json::to_string_pretty(&copy)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusRecord {
    status: DeployStatus,
    updated_at: String,
}

/// File-backed [`Store`] rooted at a directory managed by [`StoreLayout`].
pub struct FsStore {
    layout: StoreLayout,
}

impl FsStore {
    /// Open (and initialize if needed) a store at the given root.
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let layout = StoreLayout::new(root);
        layout.initialize()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn write_record(&self, dest: &Path, content: &str) -> Result<(), StoreError> {
        let dir = dest
            .parent()
            .ok_or_else(|| StoreError::Io(std::io::Error::other("record path has no parent")))?;
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(dir)?;
        Ok(())
    }

    fn read_app_record(&self, path: &Path) -> Result<Application, StoreError> {
        let content = fs::read_to_string(path)?;
        let record: AppRecord = serde_json::from_str(&content)?;

        // Verify checksum if present (backward-compatible: legacy files have None).
        if let Some(ref expected) = record.checksum {
            let actual = record.compute_checksum()?;
            if actual != *expected {
                return Err(StoreError::IntegrityFailure {
                    record: record.app.app_id.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(record.app)
    }
}

impl Store for FsStore {
    fn get_app_by_slug(&self, slug: &AppSlug) -> Result<Application, StoreError> {
        // Linear scan over app records. Trigger traffic is rare and
        // human-initiated; an index is not worth the consistency upkeep.
        let apps_dir = self.layout.apps_dir();
        if apps_dir.exists() {
            for entry in fs::read_dir(&apps_dir)? {
                let entry = entry?;
                let app = self.read_app_record(&entry.path())?;
                if app.slug == *slug {
                    return Ok(app);
                }
            }
        }
        Err(StoreError::AppNotFound(slug.to_string()))
    }

    fn get_app(&self, app_id: &AppId) -> Result<Application, StoreError> {
        let path = self.layout.app_path(app_id.as_str());
        if !path.exists() {
            return Err(StoreError::AppNotFound(app_id.to_string()));
        }
        self.read_app_record(&path)
    }

    fn list_downstreams(&self, app_id: &AppId) -> Result<Vec<DownstreamCluster>, StoreError> {
        Ok(self.get_app(app_id)?.downstreams)
    }

    fn get_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
    ) -> Result<DeployStatus, StoreError> {
        let path = self
            .layout
            .status_path(app_id.as_str(), cluster_id.as_str(), sequence);
        if !path.exists() {
            return Ok(DeployStatus::Unknown);
        }
        let content = fs::read_to_string(&path)?;
        let record: StatusRecord = serde_json::from_str(&content)?;
        Ok(record.status)
    }

    fn get_version_history(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
    ) -> Result<VersionHistory, StoreError> {
        let path = self
            .layout
            .history_path(app_id.as_str(), cluster_id.as_str());
        if !path.exists() {
            return Ok(VersionHistory::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn set_auto_deploy_policy(
        &self,
        app_id: &AppId,
        policy: AutoDeployPolicy,
    ) -> Result<(), StoreError> {
        let mut app = self.get_app(app_id)?;
        app.auto_deploy = policy;
        self.put_app(&app)?;
        debug!("auto-deploy policy for {app_id} set to {policy}");
        Ok(())
    }

    fn delete_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
    ) -> Result<(), StoreError> {
        let path = self
            .layout
            .status_path(app_id.as_str(), cluster_id.as_str(), sequence);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn put_app(&self, app: &Application) -> Result<(), StoreError> {
        let mut record = AppRecord {
            app: app.clone(),
            checksum: None,
        };
        record.checksum = Some(record.compute_checksum()?);
        let content = serde_json::to_string_pretty(&record)?;
        self.write_record(&self.layout.app_path(app.app_id.as_str()), &content)
    }

    fn put_version_history(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        history: &VersionHistory,
    ) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(history)?;
        self.write_record(
            &self
                .layout
                .history_path(app_id.as_str(), cluster_id.as_str()),
            &content,
        )
    }

    fn put_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
        status: DeployStatus,
    ) -> Result<(), StoreError> {
        let record = StatusRecord {
            status,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let content = serde_json::to_string_pretty(&record)?;
        self.write_record(
            &self
                .layout
                .status_path(app_id.as_str(), cluster_id.as_str(), sequence),
            &content,
        )
    }

    fn list_apps(&self) -> Result<Vec<Application>, StoreError> {
        let apps_dir = self.layout.apps_dir();
        let mut apps = Vec::new();
        if apps_dir.exists() {
            for entry in fs::read_dir(&apps_dir)? {
                let entry = entry?;
                apps.push(self.read_app_record(&entry.path())?);
            }
        }
        apps.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(apps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravel_schema::VersionRecord;

    fn sample_app(id: &str, slug: &str) -> Application {
        Application {
            app_id: AppId::new(id),
            slug: AppSlug::new(slug),
            name: None,
            auto_deploy: AutoDeployPolicy::Enabled,
            downstreams: vec![DownstreamCluster {
                cluster_id: ClusterId::new("c1"),
                name: None,
            }],
            created_at: "2026-01-01T00:00:00Z".to_owned(),
        }
    }

    #[test]
    fn app_roundtrip_by_id_and_slug() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let app = sample_app("app_1", "my-app");
        store.put_app(&app).unwrap();

        assert_eq!(store.get_app(&AppId::new("app_1")).unwrap(), app);
        assert_eq!(store.get_app_by_slug(&AppSlug::new("my-app")).unwrap(), app);
        assert!(matches!(
            store.get_app_by_slug(&AppSlug::new("missing")),
            Err(StoreError::AppNotFound(_))
        ));
    }

    #[test]
    fn tampered_app_record_fails_integrity() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.put_app(&sample_app("app_1", "my-app")).unwrap();

        let path = store.layout().app_path("app_1");
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("my-app", "ny-app")).unwrap();

        assert!(matches!(
            store.get_app(&AppId::new("app_1")),
            Err(StoreError::IntegrityFailure { .. })
        ));
    }

    #[test]
    fn absent_status_reads_as_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let status = store
            .get_deploy_status(&AppId::new("a"), &ClusterId::new("c"), 3)
            .unwrap();
        assert_eq!(status, DeployStatus::Unknown);
    }

    #[test]
    fn status_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let (app, cluster) = (AppId::new("a"), ClusterId::new("c"));

        store
            .put_deploy_status(&app, &cluster, 5, DeployStatus::Deployed)
            .unwrap();
        assert_eq!(
            store.get_deploy_status(&app, &cluster, 5).unwrap(),
            DeployStatus::Deployed
        );

        store.delete_deploy_status(&app, &cluster, 5).unwrap();
        assert_eq!(
            store.get_deploy_status(&app, &cluster, 5).unwrap(),
            DeployStatus::Unknown
        );
        // Deleting an absent record is idempotent.
        store.delete_deploy_status(&app, &cluster, 5).unwrap();
    }

    #[test]
    fn history_roundtrip_and_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let (app, cluster) = (AppId::new("a"), ClusterId::new("c"));

        assert_eq!(
            store.get_version_history(&app, &cluster).unwrap(),
            VersionHistory::default()
        );

        let history = VersionHistory {
            current: Some(VersionRecord {
                sequence: 7,
                version_label: Some("1.2.0".to_owned()),
                created_at: "2026-01-01T00:00:00Z".to_owned(),
            }),
            past: vec![VersionRecord {
                sequence: 5,
                version_label: None,
                created_at: "2025-12-01T00:00:00Z".to_owned(),
            }],
        };
        store.put_version_history(&app, &cluster, &history).unwrap();
        assert_eq!(store.get_version_history(&app, &cluster).unwrap(), history);
    }

    #[test]
    fn set_policy_rewrites_app_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.put_app(&sample_app("app_1", "my-app")).unwrap();

        store
            .set_auto_deploy_policy(&AppId::new("app_1"), AutoDeployPolicy::Disabled)
            .unwrap();
        let app = store.get_app(&AppId::new("app_1")).unwrap();
        assert_eq!(app.auto_deploy, AutoDeployPolicy::Disabled);
    }

    #[test]
    fn list_apps_sorted_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.put_app(&sample_app("app_2", "zeta")).unwrap();
        store.put_app(&sample_app("app_1", "alpha")).unwrap();

        let apps = store.list_apps().unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].slug, "alpha");
        assert_eq!(apps[1].slug, "zeta");
    }
}
