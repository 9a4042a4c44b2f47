//! Configuration operator implementation.

use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::config::HedgeConfigKey;
use crate::port::inbound::operator::configuration::{
    ConfigEngine, ConfigMarket, ConfigReference, ConfigValidationReport, ConfigView,
    ConfigurationOperator,
};

use super::entry::Operator;

impl ConfigurationOperator for Operator {
    fn show_config(&self, config_toml: &str) -> Result<ConfigView> {
        let config = Config::parse_toml(config_toml)?;
        Ok(ConfigView {
            database: config.database.clone(),
            api_bind: config.api.bind.clone(),
            engine: ConfigEngine {
                liquidity: config.engine.liquidity,
                max_order_size: config.engine.max_order_size,
                collateral_token: config.engine.collateral_token.clone(),
            },
            hedge: config.hedge.clone(),
            reference: ConfigReference {
                kind: format!("{:?}", config.reference.kind).to_lowercase(),
                base_url: config.reference.base_url.clone(),
                api_key_loaded: config.reference.api_key().is_some(),
            },
            markets: config
                .markets
                .iter()
                .map(|market| ConfigMarket {
                    id: market.id.clone(),
                    outcomes: market.outcomes.len(),
                })
                .collect(),
        })
    }

    fn validate_config(&self, config_toml: &str) -> Result<ConfigValidationReport> {
        let config = Config::parse_toml(config_toml)?;
        let mut warnings = Vec::new();

        if config.database.is_none() {
            warnings.push("No database configured; state will not survive a restart".to_string());
        }
        if config.markets.is_empty() {
            warnings.push("No markets configured".to_string());
        }
        if config.reference.base_url.is_some() && config.reference.api_key().is_none() {
            warnings.push("Reference market API key not set".to_string());
        }

        Ok(ConfigValidationReport {
            markets: config.markets.len(),
            mapped_outcomes: config.instrument_map()?.len(),
            warnings,
        })
    }

    fn set_hedge_value(&self, config_toml: &str, key: &str, value: &str) -> Result<String> {
        let config = Config::parse_toml(config_toml)?;
        let key: HedgeConfigKey = key.parse()?;
        let next = config.hedge.with(key, value)?;

        let rendered = toml::Value::try_from(&next).map_err(|e| ConfigError::Other(e.to_string()))?;
        let new_value = rendered
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| ConfigError::Other(format!("{key} missing from rendered hedge config")))?;

        let mut document: toml::Table = config_toml.parse().map_err(ConfigError::Parse)?;
        let hedge = document
            .entry("hedge")
            .or_insert(toml::Value::Table(toml::Table::new()));
        let Some(hedge) = hedge.as_table_mut() else {
            return Err(ConfigError::InvalidValue {
                field: "hedge",
                reason: "must be a table".to_string(),
            }
            .into());
        };
        // A camelCase spelling would collide with the snake_case key on parse.
        hedge.remove(key.camel_case());
        hedge.insert(key.as_str().to_string(), new_value);

        let updated = toml::to_string_pretty(&document).map_err(|e| ConfigError::Other(e.to_string()))?;
        Config::parse_toml(&updated)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rust_decimal_macros::dec;

    const EXAMPLE: &str = include_str!("../../../config.toml.example");

    #[test]
    fn show_projects_the_effective_config() {
        let view = Operator.show_config(EXAMPLE).unwrap();
        assert_eq!(view.database.as_deref(), Some("hedgeline.db"));
        assert_eq!(view.markets.len(), 2);
        assert_eq!(view.reference.kind, "paper");
        assert_eq!(view.engine.collateral_token, "USDC");
    }

    #[test]
    fn validate_counts_mappings_and_warns_without_database() {
        let report = Operator.validate_config(EXAMPLE).unwrap();
        assert_eq!(report.markets, 2);
        assert_eq!(report.mapped_outcomes, 5);

        let report = Operator.validate_config("").unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("No database")));
    }

    #[test]
    fn set_rewrites_one_hedge_key() {
        let updated = Operator.set_hedge_value(EXAMPLE, "maxPositionSize", "750.5").unwrap();
        let updated = Operator.set_hedge_value(&updated, "enabled", "false").unwrap();

        let config = Config::parse_toml(&updated).unwrap();
        assert_eq!(config.hedge.max_position_size, dec!(750.5));
        assert!(!config.hedge.enabled);
        assert_eq!(config.hedge.retry_attempts, 3);
        assert_eq!(config.markets.len(), 2);
    }

    #[test]
    fn set_replaces_a_camel_case_spelling() {
        let updated = Operator
            .set_hedge_value("[hedge]\nmaxSlippageBps = 40\n", "max_slippage_bps", "60")
            .unwrap();
        assert!(!updated.contains("maxSlippageBps"));
        assert_eq!(Config::parse_toml(&updated).unwrap().hedge.max_slippage_bps, 60);
    }

    #[test]
    fn set_rejects_unknown_keys_and_invalid_values() {
        let err = Operator.set_hedge_value(EXAMPLE, "maxLeverage", "3").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnknownKey { .. })));
        assert!(Operator.set_hedge_value(EXAMPLE, "hedge_timeout_ms", "0").is_err());
    }
}
