//! In-memory store with failure injection, for tests and local wiring.

use crate::traits::Store;
use crate::StoreError;
use caravel_schema::{
    AppId, AppSlug, Application, AutoDeployPolicy, ClusterId, DeployStatus, DownstreamCluster,
    VersionHistory,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Store operations that [`MemStore`] can be told to fail, so callers can
/// exercise degraded paths without a faulty filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    GetAppBySlug,
    GetApp,
    ListDownstreams,
    GetDeployStatus,
    GetVersionHistory,
    SetAutoDeployPolicy,
    DeleteDeployStatus,
}

#[derive(Default)]
struct Inner {
    apps: HashMap<AppId, Application>,
    history: HashMap<(AppId, ClusterId), VersionHistory>,
    status: HashMap<(AppId, ClusterId, u64), DeployStatus>,
    failures: HashSet<FailPoint>,
}

/// HashMap-backed [`Store`].
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given operation return an injected I/O error until cleared.
    pub fn fail(&self, point: FailPoint) {
        self.lock().failures.insert(point);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mem store lock poisoned")
    }

    fn check(inner: &Inner, point: FailPoint) -> Result<(), StoreError> {
        if inner.failures.contains(&point) {
            return Err(StoreError::Io(std::io::Error::other(format!(
                "injected failure at {point:?}"
            ))));
        }
        Ok(())
    }
}

impl Store for MemStore {
    fn get_app_by_slug(&self, slug: &AppSlug) -> Result<Application, StoreError> {
        let inner = self.lock();
        Self::check(&inner, FailPoint::GetAppBySlug)?;
        inner
            .apps
            .values()
            .find(|a| a.slug == *slug)
            .cloned()
            .ok_or_else(|| StoreError::AppNotFound(slug.to_string()))
    }

    fn get_app(&self, app_id: &AppId) -> Result<Application, StoreError> {
        let inner = self.lock();
        Self::check(&inner, FailPoint::GetApp)?;
        inner
            .apps
            .get(app_id)
            .cloned()
            .ok_or_else(|| StoreError::AppNotFound(app_id.to_string()))
    }

    fn list_downstreams(&self, app_id: &AppId) -> Result<Vec<DownstreamCluster>, StoreError> {
        let inner = self.lock();
        Self::check(&inner, FailPoint::ListDownstreams)?;
        inner
            .apps
            .get(app_id)
            .map(|a| a.downstreams.clone())
            .ok_or_else(|| StoreError::AppNotFound(app_id.to_string()))
    }

    fn get_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
    ) -> Result<DeployStatus, StoreError> {
        let inner = self.lock();
        Self::check(&inner, FailPoint::GetDeployStatus)?;
        Ok(inner
            .status
            .get(&(app_id.clone(), cluster_id.clone(), sequence))
            .copied()
            .unwrap_or(DeployStatus::Unknown))
    }

    fn get_version_history(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
    ) -> Result<VersionHistory, StoreError> {
        let inner = self.lock();
        Self::check(&inner, FailPoint::GetVersionHistory)?;
        Ok(inner
            .history
            .get(&(app_id.clone(), cluster_id.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn set_auto_deploy_policy(
        &self,
        app_id: &AppId,
        policy: AutoDeployPolicy,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check(&inner, FailPoint::SetAutoDeployPolicy)?;
        let app = inner
            .apps
            .get_mut(app_id)
            .ok_or_else(|| StoreError::AppNotFound(app_id.to_string()))?;
        app.auto_deploy = policy;
        Ok(())
    }

    fn delete_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check(&inner, FailPoint::DeleteDeployStatus)?;
        inner
            .status
            .remove(&(app_id.clone(), cluster_id.clone(), sequence));
        Ok(())
    }

    fn put_app(&self, app: &Application) -> Result<(), StoreError> {
        self.lock().apps.insert(app.app_id.clone(), app.clone());
        Ok(())
    }

    fn put_version_history(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        history: &VersionHistory,
    ) -> Result<(), StoreError> {
        self.lock()
            .history
            .insert((app_id.clone(), cluster_id.clone()), history.clone());
        Ok(())
    }

    fn put_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
        status: DeployStatus,
    ) -> Result<(), StoreError> {
        self.lock()
            .status
            .insert((app_id.clone(), cluster_id.clone(), sequence), status);
        Ok(())
    }

    fn list_apps(&self) -> Result<Vec<Application>, StoreError> {
        let inner = self.lock();
        let mut apps: Vec<Application> = inner.apps.values().cloned().collect();
        apps.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(apps)
    }
}
