//! Configuration projections for operator-facing adapters.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::port::inbound::config::HedgeConfig;

/// Engine section of a configuration view.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigEngine {
    pub liquidity: f64,
    pub max_order_size: Decimal,
    pub collateral_token: String,
}

/// Reference market section of a configuration view.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReference {
    pub kind: String,
    pub base_url: Option<String>,
    pub api_key_loaded: bool,
}

/// One configured market.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigMarket {
    pub id: String,
    pub outcomes: usize,
}

/// Full configuration projection for `config show`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    pub database: Option<String>,
    pub api_bind: String,
    pub engine: ConfigEngine,
    pub hedge: HedgeConfig,
    pub reference: ConfigReference,
    pub markets: Vec<ConfigMarket>,
}

/// Validation output for `config validate`.
#[derive(Debug, Clone, Default)]
pub struct ConfigValidationReport {
    pub markets: usize,
    pub mapped_outcomes: usize,
    pub warnings: Vec<String>,
}

/// Configuration use-cases for operator-facing adapters.
pub trait ConfigurationOperator: Send + Sync {
    /// Build a projection for `config show`.
    fn show_config(&self, config_toml: &str) -> Result<ConfigView>;

    /// Validate config and return non-fatal warnings.
    fn validate_config(&self, config_toml: &str) -> Result<ConfigValidationReport>;

    /// Change one allow-listed hedge key and return the rewritten document.
    ///
    /// The document is re-rendered from its parsed form, so comments are lost.
    fn set_hedge_value(&self, config_toml: &str, key: &str, value: &str) -> Result<String>;
}
