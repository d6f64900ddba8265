//! shelter server entry point.
//!
//! Boots the cache layer, runs install and activation, then serves the MCP
//! tools on stdio transport. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shelter_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod state;
mod tools;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(app = %config.app_name, version = %config.cache_version, origin = %config.origin, "Starting shelter server on stdio transport");

    let state = Arc::new(AppState::open(config).await?);
    state.clients.register("stdio").await;

    match state.lifecycle.install().await {
        Ok(report) => {
            tracing::info!(static_assets = report.static_assets, third_party = report.third_party_assets, "installed");
            match state.lifecycle.activate_if_skipping().await {
                Ok(Some(activation)) => {
                    tracing::info!(deleted = activation.deleted.len(), clients = activation.clients_claimed, "activated")
                }
                Ok(None) => tracing::info!("install is waiting for activation"),
                Err(e) => tracing::error!(error = %e, "activation failed; serving without it"),
            }
        }
        Err(e) => tracing::error!(error = %e, "install failed; activation skipped"),
    }

    let handler = handler::ShelterServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
