//! The `Deployer` seam: marking a release sequence for rollout.

use caravel_schema::AppId;
use caravel_store::{IntentQueue, StoreError, StoreLayout};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("deployment rejected: {0}")]
    Rejected(String),
}

/// Hands a (application, sequence) pair off to the rollout side.
///
/// The trigger core calls this exactly once, after all preconditions have
/// passed and stale status has been cleared. What happens to the sequence
/// afterwards belongs to the rollout machinery, not this crate.
pub trait Deployer: Send + Sync {
    fn deploy_version(&self, app_id: &AppId, sequence: u64) -> Result<(), DeployError>;
}

/// [`Deployer`] that records the handoff as a [`caravel_store::DeployIntent`]
/// in the store's intent queue.
pub struct IntentDeployer {
    queue: IntentQueue,
}

impl IntentDeployer {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            queue: IntentQueue::new(layout),
        }
    }
}

impl Deployer for IntentDeployer {
    fn deploy_version(&self, app_id: &AppId, sequence: u64) -> Result<(), DeployError> {
        self.queue.enqueue(app_id, sequence)?;
        Ok(())
    }
}
