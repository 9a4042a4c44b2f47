//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::market::{MarketConfig, MarketKind, OutcomeConfig};
use crate::infrastructure::config::settings::Config;

/// Binary market `id` with outcomes `yes`/`no` mapped to `ext-{id}-{outcome}`.
pub fn binary_market(id: &str, liquidity: Option<f64>) -> MarketConfig {
    MarketConfig {
        id: id.to_string(),
        question: format!("{id}?"),
        kind: MarketKind::Binary,
        liquidity,
        probabilities: None,
        outcomes: ["yes", "no"]
            .into_iter()
            .map(|outcome| OutcomeConfig {
                id: outcome.to_string(),
                external_instrument_id: format!("ext-{id}-{outcome}"),
                display_name: None,
            })
            .collect(),
    }
}

/// Defaults with the given markets, two hedge workers, and no database.
pub fn engine(markets: Vec<MarketConfig>) -> Config {
    let mut config = Config {
        markets,
        ..Config::default()
    };
    config.workers.count = 2;
    config.workers.capacity = 64;
    config
}
