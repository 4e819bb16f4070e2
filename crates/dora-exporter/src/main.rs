//! DORA exporter
//!
//! - Deployment webhooks: POST /api/github (X-GitHub-Event: deployment_status)
//! - Incident webhooks:   POST /api/jira
//! - Scrape endpoint:     GET /metrics
//! - Metrics survive restarts through the snapshot file.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dora_core::error::Result;
use dora_exporter::{app_state::AppState, config, router};

#[derive(Debug, Parser)]
#[command(name = "dora-exporter", version, about = "DORA metrics from GitHub and Jira webhooks")]
struct Args {
    /// Configuration file path
    #[arg(long = "config.file", default_value = "config.yml")]
    config_file: String,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warn", "error"])]
    log: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "dora-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let cfg = config::load_from_file(&args.config_file)?;
    let listen = cfg.server.listen_addr()?;

    let state = AppState::new(&cfg)?;
    // Reconcile before the listener exists: no webhook can race the import.
    state.reconcile().await;

    let app = router::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(%listen, "dora-exporter started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await?;
    tracing::info!(file = %state.snapshot_path().display(), "metrics flushed, stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, starting graceful shutdown");
}
