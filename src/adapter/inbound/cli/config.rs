//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use crate::adapter::inbound::cli::{operator, output};
use crate::error::{ConfigError, Result};

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Execute `config init`.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, CONFIG_TEMPLATE)?;

    output::success("Created configuration file");
    output::field("Path", path.display());
    output::section("Next Steps");
    output::note(&format!("1. Edit {} with your markets", path.display()));
    output::note(&format!("2. Run: hedgeline config validate -c {}", path.display()));
    output::note(&format!("3. Run: hedgeline serve -c {}", path.display()));
    Ok(())
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config_toml = operator::read_config_toml(path)?;
    let config = operator::operator()?.show_config(&config_toml)?;
    if output::is_json() {
        output::json_output(&config);
        return Ok(());
    }

    output::section("Engine");
    output::field("Liquidity (b)", config.engine.liquidity);
    output::field("Max order", config.engine.max_order_size);
    output::field("Collateral", &config.engine.collateral_token);
    output::field(
        "Database",
        config.database.as_deref().unwrap_or("(in-memory)"),
    );
    output::field("API", &config.api_bind);

    output::section("Hedge");
    let hedge = &config.hedge;
    output::field("Enabled", hedge.enabled);
    output::field("Min spread", format!("{} bps", hedge.min_spread_bps));
    output::field("Max slippage", format!("{} bps", hedge.max_slippage_bps));
    output::field("Max unhedged", hedge.max_unhedged_exposure);
    output::field("Max position", hedge.max_position_size);
    output::field("Timeout", format!("{}ms", hedge.hedge_timeout_ms));
    output::field("Retry attempts", hedge.retry_attempts);

    output::section("Reference Market");
    output::field("Kind", &config.reference.kind);
    if let Some(url) = &config.reference.base_url {
        output::field("Base URL", url);
    }
    output::field(
        "API key",
        if config.reference.api_key_loaded {
            "loaded"
        } else {
            "not set"
        },
    );

    output::section("Markets");
    if config.markets.is_empty() {
        output::note("(none configured)");
    }
    for market in &config.markets {
        output::field(&market.id, format!("{} outcomes", market.outcomes));
    }
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    output::field("Path", path.display());
    let config_toml = operator::read_config_toml(path)?;
    let report = operator::operator()?.validate_config(&config_toml)?;
    output::success("Config file is valid");
    output::field("Markets", report.markets);
    output::field("Mapped outcomes", report.mapped_outcomes);
    for warning in &report.warnings {
        output::warning(warning);
    }
    Ok(())
}

/// Execute `config set`: change one allow-listed hedge key in the file.
pub fn execute_set(path: &Path, key: &str, value: &str) -> Result<()> {
    let config_toml = operator::read_config_toml(path)?;
    let updated = operator::operator()?.set_hedge_value(&config_toml, key, value)?;
    fs::write(path, updated)?;

    output::success(&format!("Set hedge.{key}"));
    output::field(key, value.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        execute_init(&path, false).unwrap();
        assert!(execute_init(&path, false).is_err());
        assert!(execute_init(&path, true).is_ok());
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }
}
