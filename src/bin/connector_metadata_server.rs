//! connector_metadata_server — accepts metadata uploads and submits them
//! to the management API named in each document.
//!
//! Configuration is read from the environment, see `connector_metadata::config`.

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use connector_metadata::api::{build_router, MetadataState};
use connector_metadata::config::ServerConfig;
use connector_metadata::executor::HttpExecutor;
use connector_metadata::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;
    telemetry::init(&config.log_filter);

    let executor =
        HttpExecutor::new(config.upstream_timeout).context("Failed to create HTTP client")?;
    let app = build_router(MetadataState::with_executor(executor));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        upstream_timeout_secs = config.upstream_timeout.map(|t| t.as_secs()),
        "Starting connector metadata server"
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
