use anyhow::{Context, Result};
use clap::Parser;
use race_tracker::{AppConfig, AppState, InMemoryDocumentStore, RaceTracker, build_router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Race tracker HTTP server.
#[derive(Parser, Debug)]
#[command(name = "race-tracker", version, about)]
struct Cli {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for store snapshots (omit for a purely in-memory store)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Successful writes between snapshots
    #[arg(long)]
    snapshot_every: Option<usize>,

    /// Mount the administrative getAll/deleteAll routes
    #[arg(long)]
    admin: bool,
}

impl Cli {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = self.host {
            config = config.with_host(host);
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(data_dir) = self.data_dir {
            config = config.with_data_dir(data_dir);
        }
        if let Some(ops) = self.snapshot_every {
            config = config.with_snapshot_every(ops);
        }
        if self.admin {
            config = config.with_admin(true);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.apply(AppConfig::from_env().context("failed to load configuration")?);

    let store = match &config.data_dir {
        Some(dir) => {
            info!(data_dir = %dir.display(), every = config.snapshot_every_ops, "snapshot persistence enabled");
            Arc::new(
                InMemoryDocumentStore::open(dir, config.snapshot_every_ops)
                    .with_context(|| format!("failed to open store in {}", dir.display()))?,
            )
        }
        None => {
            info!("running without persistence");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let tracker = RaceTracker::new(store.clone());
    let app = build_router(AppState::new(tracker), config.admin_enabled);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, admin = config.admin_enabled, "race tracker started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(err) = store.flush().await {
        error!(error = %err, "final snapshot failed");
    }
    info!("race tracker stopped");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("race_tracker=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
