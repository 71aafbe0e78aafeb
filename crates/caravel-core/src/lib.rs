//! Deployment trigger core for Caravel.
//!
//! This crate ties the store, deployer, update scheduler, and telemetry
//! reporter together into the [`Trigger`]: given an application slug and a
//! target release sequence, it decides whether that sequence may be
//! deployed right now, clears stale per-cluster deploy status, reconciles
//! the auto-deploy policy on rollback, and hands the sequence to the
//! deployer. It also provides the [`IntentDeployer`] handoff and the
//! [`UpdateChecker`] scheduler used by the server.

pub mod deployer;
pub mod mock;
pub mod scheduler;
pub mod trigger;

pub use deployer::{DeployError, Deployer, IntentDeployer};
pub use scheduler::{SchedulerError, UpdateChecker, UpdateScheduler};
pub use trigger::Trigger;

use caravel_store::StoreError;
use thiserror::Error;

/// Why a deploy trigger was refused or failed.
///
/// The first three variants mean the request itself cannot succeed as
/// given; the last three are transient collaborator failures the caller
/// may retry (this crate never retries on its own).
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("application not found: {0}")]
    AppNotFound(String),
    #[error("application {0} has no downstream cluster to deploy to")]
    NoDownstream(String),
    #[error("sequence {sequence} is awaiting configuration and cannot be deployed")]
    PendingConfig { sequence: u64 },
    #[error("store read failed: {0}")]
    Lookup(#[source] StoreError),
    #[error("failed to clear deploy status: {0}")]
    Mutation(#[source] StoreError),
    #[error("deployer refused the version: {0}")]
    Deploy(#[source] DeployError),
}
