//! Exposure ledger: directional exposure per (market, outcome).
//!
//! The matcher records each committed curve fill; the hedge dispatcher
//! records each completed hedge. Everything else only reads.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::exposure::ExposurePosition;
use crate::domain::id::{MarketId, OutcomeId};
use crate::domain::money::Volume;

/// Totals across every position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExposureTotals {
    /// Sum of signed net exposure.
    pub net: Decimal,
    /// Sum of per-position unhedged exposure.
    pub unhedged: Decimal,
    /// Sum of completed hedge notional.
    pub hedged: Decimal,
}

/// Concurrent map of exposure positions.
#[derive(Debug, Default)]
pub struct ExposureLedger {
    positions: DashMap<(MarketId, OutcomeId), ExposurePosition>,
}

impl ExposureLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signed curve-fill delta.
    pub fn record_fill(&self, market_id: &MarketId, outcome_id: &OutcomeId, delta: Volume) {
        let mut entry = self
            .positions
            .entry((market_id.clone(), outcome_id.clone()))
            .or_insert_with(|| ExposurePosition::new(market_id.clone(), outcome_id.clone()));
        entry.record_fill(delta);
        debug!(
            market_id = %market_id,
            outcome_id = %outcome_id,
            delta = %delta,
            net = %entry.net_exposure,
            "Exposure recorded"
        );
    }

    /// Add a signed completed hedge.
    pub fn record_hedge(
        &self,
        market_id: &MarketId,
        outcome_id: &OutcomeId,
        delta: Volume,
        at: DateTime<Utc>,
    ) {
        let mut entry = self
            .positions
            .entry((market_id.clone(), outcome_id.clone()))
            .or_insert_with(|| ExposurePosition::new(market_id.clone(), outcome_id.clone()));
        entry.record_hedge(delta, at);
        debug!(
            market_id = %market_id,
            outcome_id = %outcome_id,
            delta = %delta,
            unhedged = %entry.unhedged(),
            "Hedge recorded against exposure"
        );
    }

    #[must_use]
    pub fn position(&self, market_id: &MarketId, outcome_id: &OutcomeId) -> Option<ExposurePosition> {
        self.positions
            .get(&(market_id.clone(), outcome_id.clone()))
            .map(|entry| entry.value().clone())
    }

    /// Every position, sorted by market then outcome.
    #[must_use]
    pub fn positions(&self) -> Vec<ExposurePosition> {
        let mut positions: Vec<ExposurePosition> =
            self.positions.iter().map(|entry| entry.value().clone()).collect();
        positions.sort_by(|a, b| {
            (a.market_id.as_str(), a.outcome_id.as_str())
                .cmp(&(b.market_id.as_str(), b.outcome_id.as_str()))
        });
        positions
    }

    #[must_use]
    pub fn totals(&self) -> ExposureTotals {
        self.positions
            .iter()
            .fold(ExposureTotals::default(), |mut totals, entry| {
                totals.net += entry.net_exposure;
                totals.unhedged += entry.unhedged();
                totals.hedged += entry.hedged_amount;
                totals
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fills_and_hedges_accumulate_per_key() {
        let ledger = ExposureLedger::new();
        let m = MarketId::new("m");
        let yes = OutcomeId::new("yes");

        ledger.record_fill(&m, &yes, dec!(100));
        ledger.record_fill(&m, &yes, dec!(-40));
        ledger.record_hedge(&m, &yes, dec!(60), Utc::now());

        let position = ledger.position(&m, &yes).unwrap();
        assert_eq!(position.net_exposure, dec!(60));
        assert_eq!(position.unhedged(), Decimal::ZERO);
    }

    #[test]
    fn totals_span_markets() {
        let ledger = ExposureLedger::new();
        ledger.record_fill(&MarketId::new("a"), &OutcomeId::new("yes"), dec!(10));
        ledger.record_fill(&MarketId::new("b"), &OutcomeId::new("x"), dec!(-5));
        ledger.record_hedge(&MarketId::new("a"), &OutcomeId::new("yes"), dec!(4), Utc::now());

        let totals = ledger.totals();
        assert_eq!(totals.net, dec!(5));
        assert_eq!(totals.unhedged, dec!(11));
        assert_eq!(totals.hedged, dec!(4));
        assert_eq!(ledger.positions().len(), 2);
        assert_eq!(ledger.positions()[0].market_id.as_str(), "a");
    }
}
