//! Domain types, identifiers, and input validation for Caravel.
//!
//! This crate defines the schema layer: typed identifiers (`AppId`,
//! `AppSlug`, `ClusterId`), application and downstream cluster records,
//! release sequence status and version history, and the stateless input
//! validators used at the transport boundary.

pub mod app;
pub mod release;
pub mod types;
pub mod validation;

pub use app::{Application, AutoDeployPolicy, DeployOptions, DownstreamCluster};
pub use release::{DeployStatus, VersionHistory, VersionRecord};
pub use types::{AppId, AppSlug, ClusterId};
pub use validation::{validate_slug, RegexValidator, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
