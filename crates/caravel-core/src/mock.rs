//! Recording collaborator doubles for exercising the trigger pipeline.

use crate::deployer::{DeployError, Deployer};
use crate::scheduler::{SchedulerError, UpdateScheduler};
use caravel_report::{ReportError, Reporter};
use caravel_schema::AppId;
use caravel_store::StoreError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};

/// Deployer that records every handoff and can be told to refuse them.
#[derive(Default)]
pub struct RecordingDeployer {
    calls: Mutex<Vec<(AppId, u64)>>,
    fail: AtomicBool,
}

impl RecordingDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(AppId, u64)> {
        self.calls.lock().expect("deployer lock poisoned").clone()
    }
}

impl Deployer for RecordingDeployer {
    fn deploy_version(&self, app_id: &AppId, sequence: u64) -> Result<(), DeployError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeployError::Rejected("injected refusal".to_owned()));
        }
        self.calls
            .lock()
            .expect("deployer lock poisoned")
            .push((app_id.clone(), sequence));
        Ok(())
    }
}

/// Scheduler that records reconfigure calls and can be told to fail them.
#[derive(Default)]
pub struct RecordingScheduler {
    calls: Mutex<Vec<AppId>>,
    fail: AtomicBool,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<AppId> {
        self.calls.lock().expect("scheduler lock poisoned").clone()
    }
}

impl UpdateScheduler for RecordingScheduler {
    fn reconfigure(&self, app_id: &AppId) -> Result<(), SchedulerError> {
        self.calls
            .lock()
            .expect("scheduler lock poisoned")
            .push(app_id.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(SchedulerError::Store(StoreError::LockFailed(
                "injected failure".to_owned(),
            )));
        }
        Ok(())
    }
}

/// One observed telemetry delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCall {
    pub app_id: AppId,
    pub sequence: u64,
    pub skip_preflights: bool,
    pub is_cli: bool,
}

/// Reporter that forwards every delivery onto a channel, so tests can wait
/// for the detached telemetry thread without sleeping.
pub struct ChannelReporter {
    tx: Mutex<mpsc::Sender<ReportCall>>,
    fail: AtomicBool,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::Receiver<ReportCall>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx: Mutex::new(tx),
                fail: AtomicBool::new(false),
            },
            rx,
        )
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Reporter for ChannelReporter {
    fn report_deploy_context(
        &self,
        app_id: &AppId,
        sequence: u64,
        skip_preflights: bool,
        is_cli: bool,
    ) -> Result<(), ReportError> {
        // Record the call even when failing: tests assert on invocation,
        // not delivery.
        let _ = self
            .tx
            .lock()
            .expect("reporter lock poisoned")
            .send(ReportCall {
                app_id: app_id.clone(),
                sequence,
                skip_preflights,
                is_cli,
            });
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReportError::Http("injected failure".to_owned()));
        }
        Ok(())
    }
}
