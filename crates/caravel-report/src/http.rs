use crate::{ReportError, Reporter, ReporterConfig};
use caravel_schema::AppId;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DeployContextPayload<'a> {
    app_id: &'a str,
    sequence: u64,
    skip_preflights: bool,
    is_cli: bool,
}

/// HTTP-based telemetry reporter.
///
/// POSTs a JSON deploy-context payload to `{endpoint}/v1/deploy-context`
/// with an optional bearer token. Callers treat delivery as best-effort;
/// this type just reports the failure honestly.
pub struct HttpReporter {
    config: ReporterConfig,
    agent: ureq::Agent,
}

impl HttpReporter {
    pub fn new(config: ReporterConfig) -> Self {
        let agent = ureq::Agent::new_with_defaults();
        Self { config, agent }
    }
}

impl Reporter for HttpReporter {
    fn report_deploy_context(
        &self,
        app_id: &AppId,
        sequence: u64,
        skip_preflights: bool,
        is_cli: bool,
    ) -> Result<(), ReportError> {
        let payload = DeployContextPayload {
            app_id: app_id.as_str(),
            sequence,
            skip_preflights,
            is_cli,
        };
        let body = serde_json::to_vec(&payload).map_err(|e| ReportError::Payload(e.to_string()))?;

        let url = format!("{}/v1/deploy-context", self.config.endpoint);
        tracing::debug!("delivering deploy context for {app_id} sequence {sequence} to {url}");
        let mut req = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(ref token) = self.config.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        req.send(&body[..])
            .map_err(|e| ReportError::Http(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::mpsc;

    // Minimal one-shot HTTP sink to capture the reported payload.
    fn spawn_sink() -> (String, mpsc::Receiver<(String, Vec<u8>)>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            if let Ok(mut req) = server.recv() {
                let url = req.url().to_owned();
                let mut body = Vec::new();
                let _ = req.as_reader().read_to_end(&mut body);
                let _ = tx.send((url, body));
                let _ = req.respond(tiny_http::Response::from_string("ok"));
            }
        });
        (format!("http://127.0.0.1:{port}"), rx)
    }

    #[test]
    fn posts_payload_to_deploy_context_route() {
        let (endpoint, rx) = spawn_sink();
        let reporter = HttpReporter::new(ReporterConfig::new(&endpoint));

        reporter
            .report_deploy_context(&AppId::new("app_1"), 5, true, false)
            .unwrap();

        let (url, body) = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(url, "/v1/deploy-context");
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["app_id"], "app_1");
        assert_eq!(json["sequence"], 5);
        assert_eq!(json["skip_preflights"], true);
        assert_eq!(json["is_cli"], false);
    }

    #[test]
    fn unreachable_endpoint_is_an_error_not_a_panic() {
        let reporter = HttpReporter::new(ReporterConfig::new("http://127.0.0.1:1"));
        let err = reporter
            .report_deploy_context(&AppId::new("app_1"), 1, false, true)
            .unwrap_err();
        assert!(matches!(err, ReportError::Http(_)));
    }
}
