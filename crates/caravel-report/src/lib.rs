//! Best-effort deploy telemetry delivery for Caravel.
//!
//! Defines the [`Reporter`] seam the trigger core fires after a deploy has
//! been handed off, plus the [`HttpReporter`] implementation and a
//! [`NullReporter`] for wiring without a telemetry endpoint. Delivery is
//! fire-and-forget by contract: failures here never affect a deploy result.

pub mod config;
pub mod http;

pub use config::ReporterConfig;
pub use http::HttpReporter;

use caravel_schema::AppId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("payload error: {0}")]
    Payload(String),
}

/// Delivery of deploy-context telemetry.
pub trait Reporter: Send + Sync {
    fn report_deploy_context(
        &self,
        app_id: &AppId,
        sequence: u64,
        skip_preflights: bool,
        is_cli: bool,
    ) -> Result<(), ReportError>;
}

/// Reporter that discards everything. Used when no endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report_deploy_context(
        &self,
        _app_id: &AppId,
        _sequence: u64,
        _skip_preflights: bool,
        _is_cli: bool,
    ) -> Result<(), ReportError> {
        Ok(())
    }
}
