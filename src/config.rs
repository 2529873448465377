//! Server configuration.
//!
//! Read from the environment (a `.env` file is honoured):
//!   CONNECTOR_METADATA_BIND_ADDR            — listen address (default: 0.0.0.0:8000)
//!   CONNECTOR_METADATA_UPSTREAM_TIMEOUT_SECS — per-request timeout for management API calls
//!                                              (default: none)
//!   CONNECTOR_METADATA_LOG                  — log filter when RUST_LOG is unset

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

pub const BIND_ADDR_VAR: &str = "CONNECTOR_METADATA_BIND_ADDR";
pub const UPSTREAM_TIMEOUT_VAR: &str = "CONNECTOR_METADATA_UPSTREAM_TIMEOUT_SECS";
pub const LOG_FILTER_VAR: &str = "CONNECTOR_METADATA_LOG";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_LOG_FILTER: &str = "connector_metadata=info,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub upstream_timeout: Option<Duration>,
    pub log_filter: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get(BIND_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .with_context(|| format!("{} is not a socket address", BIND_ADDR_VAR))?;

        let upstream_timeout = get(UPSTREAM_TIMEOUT_VAR)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a whole number of seconds", UPSTREAM_TIMEOUT_VAR))
            })
            .transpose()?;

        let log_filter = get(LOG_FILTER_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            bind_addr,
            upstream_timeout,
            log_filter,
        })
    }
}
