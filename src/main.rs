//! catalog-chat-gateway entry point.
//!
//! `catalog-chat-gateway [PORT] [CLUSTER]`: without `CLUSTER` this process
//! serves requests itself; with it, it supervises one worker per CPU.

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use catalog_chat_gateway::cli::Cli;
use catalog_chat_gateway::cluster::{CurrentExeLauncher, Supervisor};
use catalog_chat_gateway::config::{SupervisorConfig, WorkerConfig, available_cpus};
use catalog_chat_gateway::error::GatewayError;
use catalog_chat_gateway::worker;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = if cli.is_cluster() {
        run_supervisor(&cli).await
    } else {
        run_worker(cli.port).await
    };

    if let Err(e) = &outcome {
        tracing::error!(error = %e, pid = std::process::id(), "fatal");
    }
    outcome.map_err(Into::into)
}

async fn run_supervisor(cli: &Cli) -> Result<(), GatewayError> {
    let config = SupervisorConfig::from_env(cli.workers);
    tracing::info!(
        cpus = available_cpus(),
        workers = config.worker_count,
        pid = std::process::id(),
        "primary running"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        worker::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let launcher = CurrentExeLauncher::new(cli.port).map_err(GatewayError::Spawn)?;
    Supervisor::new(launcher, config).run(shutdown_rx).await
}

async fn run_worker(port: u16) -> Result<(), GatewayError> {
    let config = WorkerConfig::from_env()?;
    worker::run(port, config).await
}
