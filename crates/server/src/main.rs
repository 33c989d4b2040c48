//! lombasku-offline server entry point.
//!
//! Boots the offline worker (install, then activate) and serves it as an MCP
//! server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use lombasku_client::{HttpNetwork, NetworkConfig};
use lombasku_core::worker::{RegistrationPolicy, RegistrationState};
use lombasku_core::{AppConfig, CacheStore, EventOutcome, Network, OfflineWorker, WorkerEvent};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, db = %config.db_path.display(), "Starting lombasku-offline on stdio transport");

    let mut registration = RegistrationState::on_ready(RegistrationPolicy::from_config(&config));

    let store = CacheStore::open(&config.db_path).await?;
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(NetworkConfig::from(&config))?);
    let worker = Arc::new(OfflineWorker::new(config, store, network.clone())?);
    registration.record_registration();

    let report = worker.start().await?;
    tracing::info!(
        cached = report.install.cached.len(),
        failed = report.install.failed.len(),
        state = %worker.state(),
        "worker started"
    );
    registration.on_installed();

    let updates = tokio::spawn(poll_updates(worker.clone(), registration.policy().update_interval()));

    let handler = handler::LombaskuServer::new(worker.clone(), network, registration);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    updates.abort();
    worker.settle().await;

    Ok(())
}

/// Periodic update check: re-run install so the critical assets are refetched.
async fn poll_updates(worker: Arc<OfflineWorker>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match worker.dispatch(WorkerEvent::Install).await {
            Ok(EventOutcome::Installed(report)) => {
                tracing::debug!(cached = report.cached.len(), failed = report.failed.len(), "update check");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "update check failed"),
        }
    }
}
