//! Application and downstream cluster records.

use crate::types::{AppId, AppSlug, ClusterId};
use serde::{Deserialize, Serialize};

/// Per-application setting controlling whether new release sequences are
/// deployed automatically as they become available.
///
/// The trigger core flips this to `Disabled` when a past sequence is
/// redeployed, so an automatic update pass cannot immediately undo a manual
/// rollback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AutoDeployPolicy {
    Enabled,
    Disabled,
}

impl std::fmt::Display for AutoDeployPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoDeployPolicy::Enabled => write!(f, "enabled"),
            AutoDeployPolicy::Disabled => write!(f, "disabled"),
        }
    }
}

/// A target environment a release sequence is deployed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownstreamCluster {
    pub cluster_id: ClusterId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A deployable unit managed by the system.
///
/// Created and persisted outside the trigger core; the core reads everything
/// except `auto_deploy`, which it may flip to `Disabled` on rollback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    pub app_id: AppId,
    pub slug: AppSlug,
    #[serde(default)]
    pub name: Option<String>,
    pub auto_deploy: AutoDeployPolicy,
    pub downstreams: Vec<DownstreamCluster>,
    pub created_at: String,
}

/// Caller-supplied flags for a deploy trigger.
///
/// These are informational: they influence the telemetry step only, never
/// the deploy decision itself.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeployOptions {
    #[serde(default)]
    pub skip_preflights: bool,
    #[serde(default)]
    pub continue_with_failed_preflights: bool,
    #[serde(default)]
    pub is_cli: bool,
}
