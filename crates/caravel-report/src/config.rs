use serde::{Deserialize, Serialize};

/// Where deploy context telemetry is delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub endpoint: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl ReporterConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            auth_token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }
}
