//! The `Store` trait: the persistence seam consumed by the trigger core.

use crate::StoreError;
use caravel_schema::{
    AppId, AppSlug, Application, AutoDeployPolicy, ClusterId, DeployStatus, DownstreamCluster,
    VersionHistory,
};

/// Persistence operations for applications, downstream clusters, version
/// history, and per-sequence deploy status.
///
/// The trigger core treats every read-then-write sequence against this
/// trait as best-effort: no optimistic-concurrency check, no transaction.
/// Implementations are expected to serialize individual record mutations
/// but not cross-record consistency.
pub trait Store: Send + Sync {
    /// Resolve an application by its slug.
    /// Unknown slugs are [`StoreError::AppNotFound`].
    fn get_app_by_slug(&self, slug: &AppSlug) -> Result<Application, StoreError>;

    /// Fetch an application by id.
    fn get_app(&self, app_id: &AppId) -> Result<Application, StoreError>;

    /// List an application's downstream clusters, in registration order.
    fn list_downstreams(&self, app_id: &AppId) -> Result<Vec<DownstreamCluster>, StoreError>;

    /// Fetch the recorded deploy status for a (app, cluster, sequence)
    /// tuple. An absent record is [`DeployStatus::Unknown`], not an error.
    fn get_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
    ) -> Result<DeployStatus, StoreError>;

    /// Fetch the version history for an application on one cluster.
    fn get_version_history(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
    ) -> Result<VersionHistory, StoreError>;

    /// Set the application's automatic deploy policy.
    fn set_auto_deploy_policy(
        &self,
        app_id: &AppId,
        policy: AutoDeployPolicy,
    ) -> Result<(), StoreError>;

    /// Remove the recorded deploy status for a tuple so a fresh deployment
    /// cycle can be observed cleanly. Deleting an absent record succeeds.
    fn delete_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
    ) -> Result<(), StoreError>;

    /// Persist an application record. Registration surface; the trigger
    /// core itself never calls this.
    fn put_app(&self, app: &Application) -> Result<(), StoreError>;

    /// Persist a version history record.
    fn put_version_history(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        history: &VersionHistory,
    ) -> Result<(), StoreError>;

    /// Persist a deploy status record.
    fn put_deploy_status(
        &self,
        app_id: &AppId,
        cluster_id: &ClusterId,
        sequence: u64,
        status: DeployStatus,
    ) -> Result<(), StoreError>;

    /// List all registered applications, ordered by slug.
    fn list_apps(&self) -> Result<Vec<Application>, StoreError>;
}
