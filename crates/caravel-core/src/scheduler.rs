//! The `UpdateScheduler` seam and the policy-driven update checker.

use caravel_schema::{AppId, AutoDeployPolicy};
use caravel_store::{Store, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Re-arms recurring update checks for one application after its
/// auto-deploy policy may have changed.
pub trait UpdateScheduler: Send + Sync {
    fn reconfigure(&self, app_id: &AppId) -> Result<(), SchedulerError>;
}

/// Tracks which applications have automatic update checks armed and when
/// each is next due.
///
/// `reconfigure` re-reads the application's policy from the store: an
/// `Enabled` policy (re)arms the schedule entry, `Disabled` removes it.
/// The server drains [`due`](Self::due) from a background loop; this type
/// does not run its own thread.
pub struct UpdateChecker {
    store: Arc<dyn Store>,
    interval: Duration,
    schedules: Mutex<HashMap<AppId, Instant>>,
}

impl UpdateChecker {
    pub fn new(store: Arc<dyn Store>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            schedules: Mutex::new(HashMap::new()),
        }
    }

    /// True when the application currently has a check scheduled.
    pub fn armed(&self, app_id: &AppId) -> bool {
        self.lock().contains_key(app_id)
    }

    /// Return the applications whose next check time has passed, re-arming
    /// each for one interval from `now`.
    pub fn due(&self, now: Instant) -> Vec<AppId> {
        let mut schedules = self.lock();
        let mut due = Vec::new();
        for (app_id, next) in schedules.iter_mut() {
            if *next <= now {
                due.push(app_id.clone());
                *next = now + self.interval;
            }
        }
        due.sort();
        due
    }

    /// Arm schedule entries for every registered application whose policy
    /// is enabled. Called once at server startup.
    pub fn arm_all(&self) -> Result<(), SchedulerError> {
        for app in self.store.list_apps()? {
            self.reconfigure(&app.app_id)?;
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AppId, Instant>> {
        self.schedules.lock().expect("scheduler lock poisoned")
    }
}

impl UpdateScheduler for UpdateChecker {
    fn reconfigure(&self, app_id: &AppId) -> Result<(), SchedulerError> {
        let app = self.store.get_app(app_id)?;
        match app.auto_deploy {
            AutoDeployPolicy::Enabled => {
                self.lock()
                    .insert(app_id.clone(), Instant::now() + self.interval);
                tracing::debug!("update checks armed for {app_id}");
            }
            AutoDeployPolicy::Disabled => {
                self.lock().remove(app_id);
                tracing::debug!("update checks disarmed for {app_id}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravel_schema::{AppSlug, Application, ClusterId, DownstreamCluster};
    use caravel_store::MemStore;

    fn seed(store: &MemStore, policy: AutoDeployPolicy) -> AppId {
        let app = Application {
            app_id: AppId::new("app_1"),
            slug: AppSlug::new("my-app"),
            name: None,
            auto_deploy: policy,
            downstreams: vec![DownstreamCluster {
                cluster_id: ClusterId::new("c1"),
                name: None,
            }],
            created_at: "2026-01-01T00:00:00Z".to_owned(),
        };
        store.put_app(&app).unwrap();
        app.app_id
    }

    #[test]
    fn reconfigure_arms_enabled_policy() {
        let store = Arc::new(MemStore::new());
        let app_id = seed(&store, AutoDeployPolicy::Enabled);
        let checker = UpdateChecker::new(store, Duration::from_secs(60));

        checker.reconfigure(&app_id).unwrap();
        assert!(checker.armed(&app_id));
    }

    #[test]
    fn reconfigure_disarms_disabled_policy() {
        let store = Arc::new(MemStore::new());
        let app_id = seed(&store, AutoDeployPolicy::Enabled);
        let checker =
            UpdateChecker::new(Arc::clone(&store) as Arc<dyn Store>, Duration::from_secs(60));

        checker.reconfigure(&app_id).unwrap();
        assert!(checker.armed(&app_id));

        store
            .set_auto_deploy_policy(&app_id, AutoDeployPolicy::Disabled)
            .unwrap();
        checker.reconfigure(&app_id).unwrap();
        assert!(!checker.armed(&app_id));
    }

    #[test]
    fn due_returns_and_rearms() {
        let store = Arc::new(MemStore::new());
        let app_id = seed(&store, AutoDeployPolicy::Enabled);
        let checker = UpdateChecker::new(store, Duration::from_secs(60));
        checker.reconfigure(&app_id).unwrap();

        // Nothing due immediately after arming.
        assert!(checker.due(Instant::now()).is_empty());

        // Jump past the interval.
        let later = Instant::now() + Duration::from_secs(120);
        assert_eq!(checker.due(later), vec![app_id.clone()]);
        // Re-armed one interval out from `later`.
        assert!(checker.due(later).is_empty());
        assert!(checker.armed(&app_id));
    }

    #[test]
    fn reconfigure_unknown_app_is_a_store_error() {
        let store = Arc::new(MemStore::new());
        let checker = UpdateChecker::new(store, Duration::from_secs(60));
        assert!(checker.reconfigure(&AppId::new("nope")).is_err());
    }
}
