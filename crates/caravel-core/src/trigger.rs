//! The deployment trigger pipeline.

use crate::deployer::Deployer;
use crate::scheduler::UpdateScheduler;
use crate::TriggerError;
use caravel_report::Reporter;
use caravel_schema::{AppSlug, AutoDeployPolicy, DeployOptions, DeployStatus};
use caravel_store::Store;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An independently fallible sub-step whose failure is logged but must not
/// short-circuit the remaining actions or the pipeline.
type BestEffortAction<'a> = (&'static str, Box<dyn FnOnce() -> Result<(), String> + 'a>);

/// Run an ordered list of best-effort actions, logging each failure and
/// continuing with the rest.
fn run_best_effort(actions: Vec<BestEffortAction<'_>>) {
    for (label, action) in actions {
        if let Err(e) = action() {
            warn!("{label} failed: {e}");
        }
    }
}

/// Decides whether a release sequence may be deployed right now and
/// performs the state transitions to (re)trigger deployment.
///
/// One `deploy` call runs synchronously on the caller's thread; only the
/// trailing telemetry step detaches. The trigger performs no cross-request
/// locking of its own: concurrent triggers on the same (application,
/// cluster, sequence) tuple can race, which is accepted for this rare,
/// human-initiated operation.
pub struct Trigger {
    store: Arc<dyn Store>,
    deployer: Arc<dyn Deployer>,
    scheduler: Arc<dyn UpdateScheduler>,
    reporter: Arc<dyn Reporter>,
}

impl Trigger {
    pub fn new(
        store: Arc<dyn Store>,
        deployer: Arc<dyn Deployer>,
        scheduler: Arc<dyn UpdateScheduler>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            store,
            deployer,
            scheduler,
            reporter,
        }
    }

    /// Trigger deployment of `sequence` for the application behind `slug`.
    ///
    /// On success the sequence has been handed to the deployer and the
    /// caller may report completion immediately; telemetry continues on a
    /// detached thread. There is no "already deploying" guard: two
    /// back-to-back triggers for the same tuple both proceed, the second
    /// observing whatever state the first left behind.
    pub fn deploy(
        &self,
        slug: &AppSlug,
        sequence: u64,
        options: DeployOptions,
    ) -> Result<(), TriggerError> {
        let app = self.store.get_app_by_slug(slug).map_err(|e| {
            if e.is_not_found() {
                TriggerError::AppNotFound(slug.to_string())
            } else {
                TriggerError::Lookup(e)
            }
        })?;

        let downstreams = self
            .store
            .list_downstreams(&app.app_id)
            .map_err(TriggerError::Lookup)?;
        // Single-target assumption: this flow always operates on the first
        // downstream cluster. A multi-cluster trigger needs an explicit
        // target parameter here instead.
        let Some(target) = downstreams.first() else {
            return Err(TriggerError::NoDownstream(slug.to_string()));
        };

        let status = self
            .store
            .get_deploy_status(&app.app_id, &target.cluster_id, sequence)
            .map_err(TriggerError::Lookup)?;
        if status == DeployStatus::PendingConfig {
            info!("not deploying sequence {sequence} for {slug}: status is {status}");
            return Err(TriggerError::PendingConfig { sequence });
        }

        let history = self
            .store
            .get_version_history(&app.app_id, &target.cluster_id)
            .map_err(TriggerError::Lookup)?;
        if history.is_past(sequence) {
            // A past sequence is being redeployed. Disable automatic
            // deployments so an update pass cannot undo this action, and
            // re-arm the checker with the new policy. Neither failure
            // blocks the deploy: a human already asked for it explicitly.
            info!("disabling automatic deployments for {slug}: past sequence {sequence} is being redeployed");
            run_best_effort(vec![
                (
                    "disabling auto-deploy policy",
                    Box::new(|| {
                        self.store
                            .set_auto_deploy_policy(&app.app_id, AutoDeployPolicy::Disabled)
                            .map_err(|e| e.to_string())
                    }),
                ),
                (
                    "reconfiguring update checker",
                    Box::new(|| {
                        self.scheduler
                            .reconfigure(&app.app_id)
                            .map_err(|e| e.to_string())
                    }),
                ),
            ]);
        }

        // Clear stale status so a previously recorded outcome cannot be
        // misread as the outcome of this attempt.
        self.store
            .delete_deploy_status(&app.app_id, &target.cluster_id, sequence)
            .map_err(TriggerError::Mutation)?;

        self.deployer
            .deploy_version(&app.app_id, sequence)
            .map_err(TriggerError::Deploy)?;

        // Fire-and-forget telemetry. The handle is dropped: delivery has no
        // ordering guarantee and cannot affect the result returned below.
        if options.skip_preflights || options.continue_with_failed_preflights {
            let reporter = Arc::clone(&self.reporter);
            let app_id = app.app_id.clone();
            std::thread::spawn(move || {
                if let Err(e) = reporter.report_deploy_context(
                    &app_id,
                    sequence,
                    options.skip_preflights,
                    options.is_cli,
                ) {
                    debug!("failed to deliver deploy context telemetry: {e}");
                }
            });
        }

        Ok(())
    }
}
