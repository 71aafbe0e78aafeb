//! HTTP transport for the Caravel deployment trigger.
//!
//! Routes:
//! - `POST /v1/apps/{slug}/sequences/{sequence}/deploy` — trigger a deploy;
//!   optional JSON body carries the preflight/telemetry flags. 204 on success.
//! - `GET /v1/apps/{slug}` — application summary.
//! - `GET /health` — liveness probe.
//!
//! The transport decodes and validates the raw request, calls the trigger
//! core, and maps [`TriggerError`] onto HTTP status codes. The
//! [`TestServer`] helper starts a server on a random port for integration
//! testing.

pub mod config;

pub use config::{ConfigError, ServerConfig};

use caravel_core::{IntentDeployer, Trigger, TriggerError, UpdateChecker, UpdateScheduler};
use caravel_report::{HttpReporter, NullReporter, Reporter, ReporterConfig};
use caravel_schema::{validate_slug, AppSlug, Application, DeployOptions};
use caravel_store::{FsStore, Store, StoreError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

/// Everything a request handler needs: the store for reads and the wired
/// trigger pipeline for deploys.
pub struct ServerState {
    pub store: Arc<dyn Store>,
    pub checker: Arc<UpdateChecker>,
    pub trigger: Trigger,
}

impl ServerState {
    /// Open the store at `data_dir` and wire the trigger pipeline:
    /// intent-queue deployer, policy-driven update checker, and the HTTP
    /// reporter when an endpoint is configured.
    pub fn open(
        data_dir: &Path,
        reporter_config: Option<ReporterConfig>,
        check_interval: Duration,
    ) -> Result<Self, StoreError> {
        let fs_store = FsStore::open(data_dir)?;
        let layout = fs_store.layout().clone();
        let store: Arc<dyn Store> = Arc::new(fs_store);

        let checker = Arc::new(UpdateChecker::new(Arc::clone(&store), check_interval));
        if let Err(e) = checker.arm_all() {
            warn!("failed to arm update checks at startup: {e}");
        }

        let deployer = Arc::new(IntentDeployer::new(layout));
        let reporter: Arc<dyn Reporter> = match reporter_config {
            Some(config) => Arc::new(HttpReporter::new(config)),
            None => Arc::new(NullReporter),
        };

        let trigger = Trigger::new(
            Arc::clone(&store),
            deployer,
            Arc::clone(&checker) as Arc<dyn UpdateScheduler>,
            reporter,
        );

        Ok(Self {
            store,
            checker,
            trigger,
        })
    }
}

/// Deploy request body. All fields are optional flags; an empty or absent
/// body means all false.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DeployRequest {
    skip_preflights: bool,
    continue_with_failed_preflights: bool,
    is_cli: bool,
}

impl From<DeployRequest> for DeployOptions {
    fn from(req: DeployRequest) -> Self {
        DeployOptions {
            skip_preflights: req.skip_preflights,
            continue_with_failed_preflights: req.continue_with_failed_preflights,
            is_cli: req.is_cli,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppSummary {
    slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    auto_deploy: String,
    clusters: Vec<String>,
}

impl From<&Application> for AppSummary {
    fn from(app: &Application) -> Self {
        Self {
            slug: app.slug.to_string(),
            name: app.name.clone(),
            auto_deploy: app.auto_deploy.to_string(),
            clusters: app
                .downstreams
                .iter()
                .map(|d| d.cluster_id.to_string())
                .collect(),
        }
    }
}

/// Parse `/v1/apps/{slug}/sequences/{sequence}/deploy` into (slug, sequence).
///
/// Returns `None` when the shape does not match; a non-numeric sequence is
/// a shape mismatch (the transport answers 404/400 before the core runs).
pub fn parse_deploy_route(path: &str) -> Option<(&str, u64)> {
    let rest = path.strip_prefix("/v1/apps/")?;
    let (slug, rest) = rest.split_once('/')?;
    let rest = rest.strip_prefix("sequences/")?;
    let (sequence, rest) = rest.split_once('/')?;
    if rest != "deploy" || slug.is_empty() {
        return None;
    }
    let sequence: u64 = sequence.parse().ok()?;
    Some((slug, sequence))
}

/// Parse `/v1/apps/{slug}` into the slug.
pub fn parse_app_route(path: &str) -> Option<&str> {
    let slug = path.strip_prefix("/v1/apps/")?;
    if slug.is_empty() || slug.contains('/') {
        return None;
    }
    Some(slug)
}

fn respond_err(req: tiny_http::Request, code: u16, msg: &str) {
    let body = serde_json::json!({ "error": msg }).to_string();
    let header = Header::from_bytes("Content-Type", "application/json").expect("valid header");
    let _ = req.respond(
        Response::from_string(body)
            .with_header(header)
            .with_status_code(StatusCode(code)),
    );
}

fn respond_json(req: tiny_http::Request, json: impl Into<Vec<u8>>) {
    let header = Header::from_bytes("Content-Type", "application/json").expect("valid header");
    let _ = req.respond(Response::from_data(json.into()).with_header(header));
}

fn trigger_error_status(err: &TriggerError) -> u16 {
    match err {
        TriggerError::AppNotFound(_) => 404,
        TriggerError::NoDownstream(_) | TriggerError::PendingConfig { .. } => 409,
        TriggerError::Lookup(_) | TriggerError::Mutation(_) | TriggerError::Deploy(_) => 500,
    }
}

fn handle_deploy(state: &ServerState, mut req: tiny_http::Request, slug: &str, sequence: u64) {
    if validate_slug(slug).is_err() {
        respond_err(req, 400, "invalid application slug");
        return;
    }

    let mut body = Vec::new();
    if req.as_reader().read_to_end(&mut body).is_err() {
        respond_err(req, 500, "read error");
        return;
    }
    let request: DeployRequest = if body.is_empty() {
        DeployRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                respond_err(req, 400, &format!("invalid request body: {e}"));
                return;
            }
        }
    };

    match state
        .trigger
        .deploy(&AppSlug::new(slug), sequence, request.into())
    {
        Ok(()) => {
            info!("deploy triggered for {slug} sequence {sequence}");
            let _ = req.respond(Response::empty(204));
        }
        Err(e) => {
            error!("deploy trigger for {slug} sequence {sequence} failed: {e}");
            respond_err(req, trigger_error_status(&e), &e.to_string());
        }
    }
}

fn handle_app_summary(state: &ServerState, req: tiny_http::Request, slug: &str) {
    match state.store.get_app_by_slug(&AppSlug::new(slug)) {
        Ok(app) => {
            let summary = AppSummary::from(&app);
            let json = serde_json::to_vec(&summary).unwrap_or_default();
            respond_json(req, json);
        }
        Err(e) if e.is_not_found() => respond_err(req, 404, "application not found"),
        Err(e) => {
            error!("app summary for {slug} failed: {e}");
            respond_err(req, 500, &e.to_string());
        }
    }
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(state: &ServerState, req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    if let Some((slug, sequence)) = parse_deploy_route(&url) {
        let slug = slug.to_owned();
        if method == Method::Post {
            handle_deploy(state, req, &slug, sequence);
        } else {
            respond_err(req, 405, "method not allowed");
        }
    } else if let Some(slug) = parse_app_route(&url) {
        let slug = slug.to_owned();
        if method == Method::Get {
            handle_app_summary(state, req, &slug);
        } else {
            respond_err(req, 405, "method not allowed");
        }
    } else if url == "/health" && method == Method::Get {
        let _ = req.respond(Response::from_string(r#"{"status":"ok"}"#));
    } else {
        respond_err(req, 404, "not found");
    }
}

/// Run the update-check loop until `server` is unblocked/dropped elsewhere.
///
/// Release discovery itself belongs to the update collaborator; this loop
/// keeps the per-application schedules ticking so a re-armed policy takes
/// effect without a restart.
pub fn run_check_loop(checker: &UpdateChecker, stop: &std::sync::atomic::AtomicBool) {
    while !stop.load(std::sync::atomic::Ordering::SeqCst) {
        for app_id in checker.due(Instant::now()) {
            debug!("update check due for {app_id}");
        }
        std::thread::sleep(Duration::from_secs(1));
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(state: &Arc<ServerState>, server: &Server) {
    for request in server.incoming_requests() {
        handle_request(state, request);
    }
}

/// A test helper that starts a caravel-server on a random port in a
/// background thread.
///
/// Drop the `TestServer` to stop the server (via `Server::unblock`).
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub state: Arc<ServerState>,
    _server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with the given data directory.
    /// Binds to `127.0.0.1:0` (random port). No telemetry endpoint.
    pub fn start(data_dir: PathBuf) -> Self {
        let state = Arc::new(
            ServerState::open(&data_dir, None, Duration::from_secs(300))
                .expect("failed to open test store"),
        );
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let srv = Arc::clone(&server);
        let st = Arc::clone(&state);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&st, request);
            }
        });

        Self {
            url,
            port,
            data_dir,
            state,
            _server: server,
            _handle: handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_deploy_route_happy_path() {
        let (slug, sequence) = parse_deploy_route("/v1/apps/my-app/sequences/5/deploy").unwrap();
        assert_eq!(slug, "my-app");
        assert_eq!(sequence, 5);
    }

    #[test]
    fn parse_deploy_route_rejects_bad_shapes() {
        assert!(parse_deploy_route("/v1/apps/my-app/sequences/5").is_none());
        assert!(parse_deploy_route("/v1/apps/my-app/sequences/x/deploy").is_none());
        assert!(parse_deploy_route("/v1/apps//sequences/5/deploy").is_none());
        assert!(parse_deploy_route("/v2/apps/my-app/sequences/5/deploy").is_none());
        // Negative sequences never parse as u64.
        assert!(parse_deploy_route("/v1/apps/my-app/sequences/-1/deploy").is_none());
    }

    #[test]
    fn parse_app_route_happy_and_sad() {
        assert_eq!(parse_app_route("/v1/apps/my-app"), Some("my-app"));
        assert!(parse_app_route("/v1/apps/").is_none());
        assert!(parse_app_route("/v1/apps/my-app/extra").is_none());
    }

    #[test]
    fn deploy_request_accepts_wire_field_names() {
        let req: DeployRequest = serde_json::from_str(
            r#"{"skipPreflights":true,"continueWithFailedPreflights":false,"isCli":true}"#,
        )
        .unwrap();
        assert!(req.skip_preflights);
        assert!(!req.continue_with_failed_preflights);
        assert!(req.is_cli);
    }

    #[test]
    fn trigger_errors_map_to_expected_statuses() {
        assert_eq!(
            trigger_error_status(&TriggerError::AppNotFound("x".to_owned())),
            404
        );
        assert_eq!(
            trigger_error_status(&TriggerError::PendingConfig { sequence: 3 }),
            409
        );
        assert_eq!(
            trigger_error_status(&TriggerError::NoDownstream("x".to_owned())),
            409
        );
    }
}
