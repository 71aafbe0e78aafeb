mod commands;

use caravel_core::{IntentDeployer, Trigger, UpdateChecker};
use caravel_report::{HttpReporter, NullReporter, Reporter, ReporterConfig};
use caravel_schema::{AutoDeployPolicy, DeployOptions};
use caravel_store::{FsStore, IntentQueue, Store};
use clap::{Parser, Subcommand, ValueEnum};
use commands::EXIT_FAILURE;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "caravel",
    version,
    about = "Deployment trigger orchestrator for cluster application releases"
)]
struct Cli {
    /// Path to the Caravel store directory.
    #[arg(long, default_value = "~/.local/share/caravel")]
    store: String,

    /// Telemetry endpoint for deploy context reports.
    #[arg(long, global = true)]
    telemetry_endpoint: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Enabled,
    Disabled,
}

impl From<PolicyArg> for AutoDeployPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Enabled => AutoDeployPolicy::Enabled,
            PolicyArg::Disabled => AutoDeployPolicy::Disabled,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Trigger deployment of a release sequence.
    Deploy {
        /// Application slug.
        slug: String,
        /// Release sequence number.
        sequence: u64,
        /// Skip preflight checks (recorded in telemetry only).
        #[arg(long, default_value_t = false)]
        skip_preflights: bool,
        /// Proceed despite failed preflights (recorded in telemetry only).
        #[arg(long, default_value_t = false)]
        continue_with_failed_preflights: bool,
    },
    /// List registered applications.
    List,
    /// Show deploy status of a sequence on the primary downstream cluster.
    Status { slug: String, sequence: u64 },
    /// Set an application's automatic deploy policy.
    Policy {
        slug: String,
        #[arg(value_enum)]
        policy: PolicyArg,
    },
    /// Register a new application.
    Register {
        slug: String,
        /// Human-readable application name.
        #[arg(long)]
        name: Option<String>,
        /// Downstream cluster id (repeatable).
        #[arg(long = "cluster", required = true)]
        clusters: Vec<String>,
    },
    /// List pending deploy intents.
    Intents,
}

fn expand_store_path(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    raw.to_owned()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let store_path = expand_store_path(&cli.store);
    let store = match FsStore::open(&store_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: failed to open store at {store_path}: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let layout = store.layout().clone();
    let store: Arc<dyn Store> = Arc::new(store);

    let checker = Arc::new(UpdateChecker::new(
        Arc::clone(&store),
        Duration::from_secs(300),
    ));
    let reporter: Arc<dyn Reporter> = match cli.telemetry_endpoint {
        Some(ref endpoint) => Arc::new(HttpReporter::new(ReporterConfig::new(endpoint))),
        None => Arc::new(NullReporter),
    };
    let trigger = Trigger::new(
        Arc::clone(&store),
        Arc::new(IntentDeployer::new(layout.clone())),
        Arc::clone(&checker) as _,
        reporter,
    );

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Deploy {
            slug,
            sequence,
            skip_preflights,
            continue_with_failed_preflights,
        } => commands::deploy::run(
            &trigger,
            &slug,
            sequence,
            DeployOptions {
                skip_preflights,
                continue_with_failed_preflights,
                is_cli: true,
            },
            json_output,
        ),
        Commands::List => commands::list::run(store.as_ref(), json_output),
        Commands::Status { slug, sequence } => {
            commands::status::run(store.as_ref(), &slug, sequence, json_output)
        }
        Commands::Policy { slug, policy } => {
            commands::policy::run(store.as_ref(), &checker, &slug, policy.into())
        }
        Commands::Register {
            slug,
            name,
            clusters,
        } => commands::register::run(store.as_ref(), &slug, name.as_deref(), &clusters, json_output),
        Commands::Intents => commands::intents::run(&IntentQueue::new(layout), json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
