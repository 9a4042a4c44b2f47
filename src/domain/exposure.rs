//! Directional exposure per market outcome.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MarketId, OutcomeId};
use super::money::Volume;

/// Exposure taken on by the house for one (market, outcome) key.
///
/// `net_exposure` is the signed running total of curve fills since
/// inception and is never reset. Completed hedges add to `hedged_net` (with
/// the same sign convention) and to the unsigned `hedged_amount`, so the
/// still-unhedged figure is `|net_exposure - hedged_net|`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposurePosition {
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub net_exposure: Volume,
    pub hedged_amount: Volume,
    pub hedged_net: Volume,
    pub last_hedge_at: Option<DateTime<Utc>>,
}

impl ExposurePosition {
    #[must_use]
    pub fn new(market_id: MarketId, outcome_id: OutcomeId) -> Self {
        Self {
            market_id,
            outcome_id,
            net_exposure: Decimal::ZERO,
            hedged_amount: Decimal::ZERO,
            hedged_net: Decimal::ZERO,
            last_hedge_at: None,
        }
    }

    /// Add a signed curve-fill delta.
    pub fn record_fill(&mut self, delta: Volume) {
        self.net_exposure += delta;
    }

    /// Add a signed, completed hedge.
    pub fn record_hedge(&mut self, delta: Volume, at: DateTime<Utc>) {
        self.hedged_net += delta;
        self.hedged_amount += delta.abs();
        self.last_hedge_at = Some(at);
    }

    #[must_use]
    pub fn unhedged(&self) -> Volume {
        (self.net_exposure - self.hedged_net).abs()
    }
}
