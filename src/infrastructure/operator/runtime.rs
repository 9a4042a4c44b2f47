//! Runtime operator implementation for `serve`.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::adapter::inbound::api;
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::shutdown::shutdown_signal;
use crate::port::inbound::operator::runtime::{RuntimeOperator, ServeRequest, ServeStartup};

use super::entry::Operator;

fn resolve(request: &ServeRequest) -> Result<(Config, SocketAddr)> {
    let mut config = Config::parse_toml(&request.config_toml)?;
    apply_overrides(&mut config, request);
    config.validate()?;
    let bind = config
        .api
        .bind
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            field: "bind",
            reason: e.to_string(),
        })?;
    Ok((config, bind))
}

fn apply_overrides(config: &mut Config, request: &ServeRequest) {
    if let Some(database) = &request.database {
        config.database = Some(database.clone());
    }
    if let Some(bind) = request.bind {
        config.api.bind = bind.to_string();
    }
    if let Some(level) = &request.log_level {
        config.logging.level = level.clone();
    }
}

#[async_trait]
impl RuntimeOperator for Operator {
    fn prepare_serve(&self, request: &ServeRequest) -> Result<ServeStartup> {
        let (config, bind) = resolve(request)?;
        config.init_logging();
        Ok(ServeStartup {
            bind,
            database: config.database.clone(),
            markets: config.markets.len(),
            hedging: config.hedge.enabled,
        })
    }

    async fn execute_serve(&self, request: ServeRequest) -> Result<()> {
        let (config, bind) = resolve(&request)?;
        config.init_logging();

        let assembly = bootstrap(&config)?;
        let scheduler = request.schedule.then(|| assembly.start_scheduler(&config));

        let served = api::serve(Arc::clone(assembly.engine()), bind, shutdown_signal()).await;

        if let Some(scheduler) = scheduler {
            scheduler.shutdown().await;
        }
        assembly.shutdown().await;
        info!("hedgeline stopped");
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ServeRequest {
        ServeRequest {
            config_toml: String::new(),
            bind: Some("0.0.0.0:9100".parse().unwrap()),
            database: Some("override.db".into()),
            log_level: Some("debug".into()),
            schedule: false,
        }
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::default();
        apply_overrides(&mut config, &request());
        assert_eq!(config.api.bind, "0.0.0.0:9100");
        assert_eq!(config.database.as_deref(), Some("override.db"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn startup_reflects_overrides() {
        let (config, bind) = resolve(&request()).unwrap();
        assert_eq!(bind, "0.0.0.0:9100".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database.as_deref(), Some("override.db"));
    }

    #[test]
    fn unparsable_bind_is_rejected() {
        let request = ServeRequest {
            config_toml: "[api]\nbind = \"not-an-address\"\n".into(),
            bind: None,
            ..request()
        };
        assert!(resolve(&request).is_err());
    }
}
