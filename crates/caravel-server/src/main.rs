use caravel_server::{run_check_loop, run_server, ServerConfig, ServerState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tiny_http::Server;
use tracing::info;

#[derive(Parser)]
#[command(name = "caravel-server", about = "Caravel deployment trigger server")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on. Overrides the config file.
    #[arg(long)]
    bind_addr: Option<String>,

    /// Directory holding the deployment store. Overrides the config file.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => ServerConfig::load(path).expect("failed to load config"),
        None => ServerConfig::default(),
    };
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    info!("starting caravel-server on {}", config.bind_addr);
    info!("data directory: {}", config.data_dir.display());

    let state = Arc::new(
        ServerState::open(
            &config.data_dir,
            config.reporter.clone(),
            Duration::from_secs(config.check_interval_secs),
        )
        .expect("failed to open deployment store"),
    );

    let server = Arc::new(Server::http(&*config.bind_addr).expect("failed to bind HTTP server"));
    let stop = Arc::new(AtomicBool::new(false));

    {
        let server = Arc::clone(&server);
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            info!("shutdown requested");
            stop.store(true, Ordering::SeqCst);
            server.unblock();
        })
        .expect("failed to install signal handler");
    }

    {
        let state = Arc::clone(&state);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || run_check_loop(&state.checker, &stop));
    }

    run_server(&state, &server);
}
