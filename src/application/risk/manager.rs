//! Risk management service.
//!
//! Gates hedge placement on the configured limits, aggregates outstanding
//! exposure, persists periodic snapshots, and assembles the risk dashboard.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::application::exposure::ExposureLedger;
use crate::application::hedge::settings::HedgeSettings;
use crate::domain::hedge::{HedgeOrder, HedgeStatus};
use crate::domain::id::{MarketId, SnapshotId};
use crate::domain::money::bps;
use crate::domain::snapshot::RiskSnapshot;
use crate::error::{HedgeError, Result};
use crate::port::inbound::config::HedgeConfig;
use crate::port::inbound::risk::{FailureSummary, MarketRisk, RiskCheckResult, RiskDashboard};
use crate::port::outbound::store::Store;

/// Failures listed on the dashboard.
const DASHBOARD_FAILURES: usize = 20;

/// Snapshots shown on the dashboard timeline.
const DASHBOARD_SNAPSHOTS: usize = 48;

/// Risk manager that validates hedges before placement.
///
/// Checks, in order:
/// - Position size (a single hedge above `max_position_size`)
/// - Unhedged exposure (pending notional plus this hedge above `max_unhedged_exposure`)
/// - Spread (a hedge priced within `min_spread_bps` of 0 or 1)
pub struct RiskManager {
    settings: Arc<HedgeSettings>,
    store: Arc<dyn Store>,
    exposure: Arc<ExposureLedger>,
    recent_window: Duration,
    external_failures: AtomicU64,
}

impl RiskManager {
    pub fn new(
        settings: Arc<HedgeSettings>,
        store: Arc<dyn Store>,
        exposure: Arc<ExposureLedger>,
        recent_window: Duration,
    ) -> Self {
        Self {
            settings,
            store,
            exposure,
            recent_window,
            external_failures: AtomicU64::new(0),
        }
    }

    /// Current hedge configuration.
    #[must_use]
    pub fn config(&self) -> Arc<HedgeConfig> {
        self.settings.snapshot()
    }

    /// Notional of every hedge that is still pending.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn aggregate_exposure(&self) -> Result<Decimal> {
        Ok(self
            .store
            .hedges_by_status(HedgeStatus::Pending)?
            .iter()
            .map(|hedge| hedge.request().amount)
            .sum())
    }

    /// Validate a pending hedge against the limits in `config`.
    ///
    /// # Errors
    ///
    /// Propagates store failures while aggregating exposure.
    pub fn check(&self, hedge: &HedgeOrder, config: &HedgeConfig) -> Result<RiskCheckResult> {
        let request = hedge.request();

        if request.amount > config.max_position_size {
            warn!(
                hedge_id = %hedge.id(),
                amount = %request.amount,
                limit = %config.max_position_size,
                "Hedge exceeds max position size"
            );
            return Ok(RiskCheckResult::Rejected(HedgeError::LimitExceeded {
                reason: format!(
                    "position size {} exceeds max {}",
                    request.amount, config.max_position_size
                ),
            }));
        }

        let others: Decimal = self
            .store
            .hedges_by_status(HedgeStatus::Pending)?
            .iter()
            .filter(|pending| pending.id() != hedge.id())
            .map(|pending| pending.request().amount)
            .sum();
        let projected = others + request.amount;
        if projected > config.max_unhedged_exposure {
            warn!(
                hedge_id = %hedge.id(),
                pending = %others,
                additional = %request.amount,
                limit = %config.max_unhedged_exposure,
                "Unhedged exposure limit would be exceeded"
            );
            return Ok(RiskCheckResult::Rejected(HedgeError::LimitExceeded {
                reason: format!(
                    "unhedged exposure {projected} exceeds max {}",
                    config.max_unhedged_exposure
                ),
            }));
        }

        let spread = bps(config.min_spread_bps);
        if request.price < spread || request.price > Decimal::ONE - spread {
            warn!(
                hedge_id = %hedge.id(),
                price = %request.price,
                min_spread_bps = config.min_spread_bps,
                "Hedge price inside minimum spread"
            );
            return Ok(RiskCheckResult::Rejected(HedgeError::LimitExceeded {
                reason: format!(
                    "price {} within {} bps of bound",
                    request.price, config.min_spread_bps
                ),
            }));
        }

        Ok(RiskCheckResult::Approved)
    }

    /// Count a reference market error or timeout.
    pub fn record_external_failure(&self) {
        self.external_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn external_failures(&self) -> u64 {
        self.external_failures.load(Ordering::Relaxed)
    }

    /// Capture and persist a risk snapshot.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn take_snapshot(&self, now: DateTime<Utc>) -> Result<RiskSnapshot> {
        let totals = self.exposure.totals();
        let open_positions = self.store.hedges_by_status(HedgeStatus::Pending)?.len() as u64;

        let since = now - self.recent_window;
        let resolved: Vec<HedgeOrder> = self
            .store
            .list_hedges()?
            .into_iter()
            .filter(|hedge| hedge.status().is_terminal() && hedge.updated_at() >= since)
            .collect();
        let recent_failures = resolved
            .iter()
            .filter(|hedge| hedge.status() == HedgeStatus::Failed)
            .count() as u64;
        #[allow(clippy::cast_precision_loss)]
        let failure_rate = if resolved.is_empty() {
            0.0
        } else {
            recent_failures as f64 / resolved.len() as f64
        };

        let snapshot = RiskSnapshot {
            id: SnapshotId::generate(),
            total_unhedged: totals.unhedged,
            total_hedged: totals.hedged,
            open_positions,
            recent_failures,
            failure_rate,
            created_at: now,
        };
        self.store.save_snapshot(&snapshot)?;
        info!(
            unhedged = %snapshot.total_unhedged,
            hedged = %snapshot.total_hedged,
            open_positions = snapshot.open_positions,
            recent_failures = snapshot.recent_failures,
            "Risk snapshot persisted"
        );
        Ok(snapshot)
    }

    /// Assemble the dashboard read model.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<RiskDashboard> {
        let hedges = self.store.list_hedges()?;
        let mut markets: BTreeMap<MarketId, MarketRisk> = BTreeMap::new();
        let mut pending_exposure = Decimal::ZERO;
        let (mut pending, mut placed, mut failed) = (0_u64, 0_u64, 0_u64);

        for hedge in &hedges {
            let entry = markets
                .entry(hedge.market_id().clone())
                .or_insert_with(|| empty_market(hedge.market_id().clone()));
            match hedge.status() {
                HedgeStatus::Pending => {
                    pending += 1;
                    entry.pending += 1;
                    pending_exposure += hedge.request().amount;
                }
                HedgeStatus::Placed => {
                    placed += 1;
                    entry.placed += 1;
                }
                HedgeStatus::Failed => {
                    failed += 1;
                    entry.failed += 1;
                }
            }
        }

        for position in self.exposure.positions() {
            let entry = markets
                .entry(position.market_id.clone())
                .or_insert_with(|| empty_market(position.market_id.clone()));
            entry.net_exposure += position.net_exposure;
            entry.unhedged += position.unhedged();
            entry.hedged_amount += position.hedged_amount;
            entry.last_hedge_at = entry.last_hedge_at.max(position.last_hedge_at);
        }

        let recent_failures = self
            .store
            .failures_since(now - self.recent_window, DASHBOARD_FAILURES)?
            .into_iter()
            .map(|hedge| FailureSummary {
                hedge_id: hedge.id().clone(),
                market_id: hedge.market_id().clone(),
                amount: hedge.request().amount,
                reason: hedge.reason().unwrap_or_default().to_string(),
                failed_at: hedge.updated_at(),
            })
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let success_rate = if placed + failed == 0 {
            0.0
        } else {
            placed as f64 / (placed + failed) as f64
        };
        let totals = self.exposure.totals();

        Ok(RiskDashboard {
            total_hedges: hedges.len() as u64,
            placed,
            failed,
            pending,
            success_rate,
            net_exposure: totals.net,
            unhedged_exposure: totals.unhedged,
            hedged_amount: totals.hedged,
            pending_exposure,
            markets: markets.into_values().collect(),
            recent_failures,
            snapshots: self.store.recent_snapshots(DASHBOARD_SNAPSHOTS)?,
            external_failures_total: self.external_failures(),
        })
    }
}

fn empty_market(market_id: MarketId) -> MarketRisk {
    MarketRisk {
        market_id,
        net_exposure: Decimal::ZERO,
        unhedged: Decimal::ZERO,
        hedged_amount: Decimal::ZERO,
        pending: 0,
        placed: 0,
        failed: 0,
        last_hedge_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::domain::id::{FillId, HedgeId, InstrumentId, OrderId, OutcomeId};
    use crate::domain::hedge::HedgeRequest;
    use crate::domain::order::Side;
    use crate::port::outbound::store::HedgeStore;
    use rust_decimal_macros::dec;

    fn hedge(id: &str, amount: Decimal, price: Decimal) -> HedgeOrder {
        HedgeOrder::pending(
            HedgeId::new(id),
            HedgeRequest {
                fill_id: FillId::generate(),
                order_id: OrderId::generate(),
                market_id: MarketId::new("m"),
                outcome_id: OutcomeId::new("yes"),
                instrument_id: InstrumentId::new("ext"),
                side: Side::Buy,
                price,
                amount,
                size: amount / price,
            },
            Utc::now(),
        )
    }

    fn manager(config: HedgeConfig) -> (RiskManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let settings = Arc::new(HedgeSettings::new(config).unwrap());
        let manager = RiskManager::new(
            settings,
            store.clone(),
            Arc::new(ExposureLedger::new()),
            Duration::hours(1),
        );
        (manager, store)
    }

    #[test]
    fn approves_within_limits() {
        let (manager, _) = manager(HedgeConfig::default());
        let config = manager.config();
        let result = manager.check(&hedge("h", dec!(100), dec!(0.5)), &config).unwrap();
        assert!(result.is_approved());
    }

    #[test]
    fn rejects_oversized_hedge() {
        let (manager, _) = manager(HedgeConfig {
            max_position_size: dec!(50),
            ..HedgeConfig::default()
        });
        let config = manager.config();
        let result = manager.check(&hedge("h", dec!(100), dec!(0.5)), &config).unwrap();
        assert!(matches!(
            result.rejection_error(),
            Some(HedgeError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn rejects_when_pending_exposure_would_exceed_cap() {
        let (manager, store) = manager(HedgeConfig {
            max_unhedged_exposure: dec!(150),
            ..HedgeConfig::default()
        });
        store.insert_hedge(&hedge("a", dec!(100), dec!(0.5))).unwrap();
        let candidate = hedge("b", dec!(60), dec!(0.5));
        store.insert_hedge(&candidate).unwrap();

        assert_eq!(manager.aggregate_exposure().unwrap(), dec!(160));
        let config = manager.config();
        let result = manager.check(&candidate, &config).unwrap();
        assert!(!result.is_approved());

        let small = hedge("c", dec!(50), dec!(0.5));
        assert!(manager.check(&small, &config).unwrap().is_approved());
    }

    #[test]
    fn rejects_price_inside_min_spread() {
        let (manager, _) = manager(HedgeConfig::default());
        let config = manager.config();
        let result = manager.check(&hedge("h", dec!(10), dec!(0.999)), &config).unwrap();
        assert!(!result.is_approved());
    }

    #[test]
    fn snapshot_counts_pending_and_recent_failures() {
        let (manager, store) = manager(HedgeConfig::default());
        store.insert_hedge(&hedge("p", dec!(10), dec!(0.5))).unwrap();
        let mut failed = hedge("f", dec!(10), dec!(0.5));
        failed.mark_failed("boom", Utc::now()).unwrap();
        store.insert_hedge(&failed).unwrap();
        let mut placed = hedge("ok", dec!(10), dec!(0.5));
        placed.mark_placed("x", dec!(20), Utc::now()).unwrap();
        store.insert_hedge(&placed).unwrap();

        let snapshot = manager.take_snapshot(Utc::now()).unwrap();
        assert_eq!(snapshot.open_positions, 1);
        assert_eq!(snapshot.recent_failures, 1);
        assert!((snapshot.failure_rate - 0.5).abs() < 1e-12);

        let dashboard = manager.dashboard(Utc::now()).unwrap();
        assert_eq!(dashboard.total_hedges, 3);
        assert!((dashboard.success_rate - 0.5).abs() < 1e-12);
        assert_eq!(dashboard.recent_failures.len(), 1);
        assert_eq!(dashboard.recent_failures[0].reason, "boom");
        assert_eq!(dashboard.snapshots.len(), 1);
        assert_eq!(dashboard.pending_exposure, dec!(10));
    }
}
