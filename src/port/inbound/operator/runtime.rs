//! Runtime control for the long-running `serve` command.

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::Result;

/// Configuration and command-line overrides for `serve`.
#[derive(Debug, Clone)]
pub struct ServeRequest {
    /// Raw TOML configuration content.
    pub config_toml: String,

    /// Override for the API bind address.
    pub bind: Option<SocketAddr>,

    /// Override for the database path.
    pub database: Option<String>,

    /// Override for the log level.
    pub log_level: Option<String>,

    /// Whether the snapshot and sweep jobs run.
    pub schedule: bool,
}

/// Resolved settings shown before the engine starts.
#[derive(Debug, Clone)]
pub struct ServeStartup {
    pub bind: SocketAddr,
    pub database: Option<String>,
    pub markets: usize,
    pub hedging: bool,
}

/// Runtime control use-cases for operator-facing adapters.
#[async_trait]
pub trait RuntimeOperator: Send + Sync {
    /// Resolve and validate the effective settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or an override is invalid.
    fn prepare_serve(&self, request: &ServeRequest) -> Result<ServeStartup>;

    /// Run the engine, API, and scheduled jobs until a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if startup fails or the API stops abnormally.
    async fn execute_serve(&self, request: ServeRequest) -> Result<()>;
}
