//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; secrets such as the reference
//! market API key are read from the environment (after `.env` is loaded).
//!
//! # Example
//!
//! ```no_run
//! use hedgeline::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::market::{instrument_map, MarketConfig};
use crate::application::matching::MatcherConfig;
use crate::application::recovery::RecoveryPolicy;
use crate::application::scheduler::Schedule;
use crate::domain::mapping::InstrumentMap;
use crate::domain::market::Market;
use crate::error::{ConfigError, Result};
use crate::port::inbound::config::HedgeConfig;

/// Matching engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default LMSR liquidity parameter `b`.
    #[serde(default = "default_liquidity")]
    pub liquidity: f64,
    /// Largest notional accepted in one trade.
    #[serde(default = "default_max_order_size")]
    pub max_order_size: Decimal,
    /// Ledger token used as collateral.
    #[serde(default = "default_collateral_token")]
    pub collateral_token: String,
}

const fn default_liquidity() -> f64 {
    10_000.0
}

fn default_max_order_size() -> Decimal {
    Decimal::from(10_000)
}

fn default_collateral_token() -> String {
    "USDC".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            liquidity: default_liquidity(),
            max_order_size: default_max_order_size(),
            collateral_token: default_collateral_token(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn matcher(&self) -> MatcherConfig {
        MatcherConfig {
            max_order_size: self.max_order_size,
            collateral_token: self.collateral_token.clone(),
        }
    }
}

/// Hedge worker pool sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_count")]
    pub count: usize,
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

const fn default_worker_count() -> usize {
    4
}

const fn default_queue_capacity() -> usize {
    1024
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            capacity: default_queue_capacity(),
        }
    }
}

/// Periodic jobs and recovery thresholds, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_stuck_after_secs")]
    pub stuck_after_secs: u64,
    #[serde(default = "default_fail_after_secs")]
    pub fail_after_secs: u64,
    #[serde(default = "default_recent_failure_window_secs")]
    pub recent_failure_window_secs: u64,
}

const fn default_snapshot_interval_secs() -> u64 {
    1_800
}

const fn default_sweep_interval_secs() -> u64 {
    86_400
}

const fn default_stuck_after_secs() -> u64 {
    300
}

const fn default_fail_after_secs() -> u64 {
    1_800
}

const fn default_recent_failure_window_secs() -> u64 {
    3_600
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: default_snapshot_interval_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            stuck_after_secs: default_stuck_after_secs(),
            fail_after_secs: default_fail_after_secs(),
            recent_failure_window_secs: default_recent_failure_window_secs(),
        }
    }
}

impl ScheduleConfig {
    #[must_use]
    pub const fn schedule(&self) -> Schedule {
        Schedule {
            snapshot_every: StdDuration::from_secs(self.snapshot_interval_secs),
            sweep_every: StdDuration::from_secs(self.sweep_interval_secs),
        }
    }

    #[must_use]
    pub fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            stuck_after: seconds(self.stuck_after_secs),
            fail_after: seconds(self.fail_after_secs),
        }
    }

    #[must_use]
    pub fn recent_failure_window(&self) -> Duration {
        seconds(self.recent_failure_window_secs)
    }
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1_000))
}

/// Which reference market client to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// Fill every hedge immediately without leaving the process.
    #[default]
    Paper,
    /// JSON-over-HTTP venue at `base_url`.
    Http,
}

/// External reference market settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub kind: ReferenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "HEDGELINE_REFERENCE_API_KEY".to_string()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            kind: ReferenceKind::default(),
            base_url: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl ReferenceConfig {
    /// API key from the environment, if set and non-empty.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Opening balance seeded into the in-memory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub user_id: String,
    /// Ledger token; the collateral token when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub balance: Decimal,
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Path to the SQLite database file. The in-memory store is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Initial hedge configuration; reloadable at runtime.
    #[serde(default)]
    pub hedge: HedgeConfig,

    #[serde(default)]
    pub workers: WorkerConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub markets: Vec<MarketConfig>,

    /// Opening balances for local runs against the in-memory ledger.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Render the effective configuration, defaults included.
    ///
    /// # Errors
    ///
    /// Fails only if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Other(e.to_string()).into())
    }

    /// Validate configuration values.
    ///
    /// Checks value ranges, the reference market settings, and that every
    /// market builds and is mapped exactly once.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] or [`ConfigError::MissingField`] for the
    /// first problem found.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if !self.engine.liquidity.is_finite() || self.engine.liquidity <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "liquidity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.engine.max_order_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "max_order_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.engine.collateral_token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "collateral_token",
            }
            .into());
        }

        self.hedge.validate()?;

        if self.workers.count == 0 || self.workers.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                reason: "count and capacity must be greater than 0".to_string(),
            }
            .into());
        }

        let schedule = &self.schedule;
        if schedule.snapshot_interval_secs == 0
            || schedule.sweep_interval_secs == 0
            || schedule.stuck_after_secs == 0
            || schedule.recent_failure_window_secs == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "schedule",
                reason: "intervals and thresholds must be greater than 0".to_string(),
            }
            .into());
        }
        if schedule.fail_after_secs <= schedule.stuck_after_secs {
            return Err(ConfigError::InvalidValue {
                field: "fail_after_secs",
                reason: "must be greater than stuck_after_secs".to_string(),
            }
            .into());
        }

        if self.reference.kind == ReferenceKind::Http {
            match self.reference.base_url.as_deref() {
                None | Some("") => {
                    return Err(ConfigError::MissingField { field: "base_url" }.into());
                }
                Some(url) => {
                    url::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                        field: "base_url",
                        reason: e.to_string(),
                    })?;
                }
            }
        }

        self.api
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "bind",
                reason: e.to_string(),
            })?;

        if let Some(account) = self
            .accounts
            .iter()
            .find(|account| account.user_id.trim().is_empty() || account.balance < Decimal::ZERO)
        {
            return Err(ConfigError::InvalidValue {
                field: "accounts",
                reason: format!("bad opening balance for '{}'", account.user_id),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for market in &self.markets {
            if !seen.insert(market.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "markets",
                    reason: format!("duplicate market id {}", market.id),
                }
                .into());
            }
        }
        self.build_markets()?;
        self.instrument_map()?;
        Ok(())
    }

    /// Build every configured market with a fresh curve.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] naming the market that failed.
    pub fn build_markets(&self) -> Result<Vec<Market>> {
        self.markets
            .iter()
            .map(|market| {
                market.build(self.engine.liquidity).map_err(|e| {
                    ConfigError::InvalidValue {
                        field: "markets",
                        reason: format!("{}: {e}", market.id),
                    }
                    .into()
                })
            })
            .collect()
    }

    /// The validated outcome to instrument mapping.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for ambiguous or duplicate mappings.
    pub fn instrument_map(&self) -> Result<InstrumentMap> {
        instrument_map(&self.markets).map_err(|e| {
            ConfigError::InvalidValue {
                field: "markets",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
