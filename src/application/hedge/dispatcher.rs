//! Hedge dispatcher: replicates curve fills onto the reference market.
//!
//! [`HedgeDispatcher::prepare`] runs synchronously right after the internal
//! commit and records a pending hedge (or a failed one when hedging is off).
//! [`HedgeDispatcher::execute`] runs later on a worker, outside any lock
//! taken by the matcher, and resolves the hedge to `placed` or `failed`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::application::exposure::ExposureLedger;
use crate::application::hedge::settings::HedgeSettings;
use crate::application::risk::manager::RiskManager;
use crate::domain::fill::Fill;
use crate::domain::hedge::{HedgeOrder, HedgeRequest, HedgeStatus, REASON_DISABLED};
use crate::domain::id::{HedgeId, MarketId};
use crate::domain::mapping::InstrumentMap;
use crate::domain::market::MarketLayout;
use crate::domain::money::{bps, Price, BASIS_POINT};
use crate::domain::order::Side;
use crate::error::HedgeError;
use crate::port::inbound::risk::RiskCheckResult;
use crate::port::outbound::reference::{ExternalOrderRequest, ReferenceMarket};
use crate::port::outbound::store::Store;

/// Decimal places kept on hedge limit prices.
const PRICE_SCALE: u32 = 4;

/// Places and resolves hedge orders.
pub struct HedgeDispatcher {
    store: Arc<dyn Store>,
    reference: Arc<dyn ReferenceMarket>,
    settings: Arc<HedgeSettings>,
    risk: Arc<RiskManager>,
    exposure: Arc<ExposureLedger>,
    mappings: Arc<InstrumentMap>,
    layouts: Arc<HashMap<MarketId, MarketLayout>>,
}

impl HedgeDispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        reference: Arc<dyn ReferenceMarket>,
        settings: Arc<HedgeSettings>,
        risk: Arc<RiskManager>,
        exposure: Arc<ExposureLedger>,
        mappings: Arc<InstrumentMap>,
        layouts: Arc<HashMap<MarketId, MarketLayout>>,
    ) -> Self {
        Self {
            store,
            reference,
            settings,
            risk,
            exposure,
            mappings,
            layouts,
        }
    }

    /// Record the hedge for a freshly committed curve fill.
    ///
    /// With hedging disabled the hedge is stored already `failed` and must
    /// not be submitted.
    ///
    /// # Errors
    ///
    /// [`HedgeError::Unmapped`] when the outcome has no instrument, or a
    /// store failure.
    pub fn prepare(&self, fill: &Fill) -> Result<HedgeOrder, HedgeError> {
        let config = self.settings.snapshot();
        let mapping = self
            .mappings
            .resolve(&fill.market_id, &fill.outcome_id)
            .ok_or_else(|| HedgeError::Unmapped {
                market_id: fill.market_id.to_string(),
                outcome_id: fill.outcome_id.to_string(),
            })?;

        let request = HedgeRequest {
            fill_id: fill.id.clone(),
            order_id: fill.order_id.clone(),
            market_id: fill.market_id.clone(),
            outcome_id: fill.outcome_id.clone(),
            instrument_id: mapping.instrument_id.clone(),
            side: fill.side,
            price: hedge_price(fill.price, fill.side, config.max_slippage_bps),
            amount: fill.amount,
            size: fill.shares,
        };
        let now = Utc::now();
        let mut hedge = HedgeOrder::pending(HedgeId::generate(), request, now);

        if !config.enabled {
            hedge.mark_failed(REASON_DISABLED, now)?;
            self.store.insert_hedge(&hedge)?;
            info!(
                hedge_id = %hedge.id(),
                fill_id = %fill.id,
                market_id = %fill.market_id,
                "Hedging disabled, hedge recorded as failed"
            );
            return Ok(hedge);
        }

        self.store.insert_hedge(&hedge)?;
        debug!(
            hedge_id = %hedge.id(),
            fill_id = %fill.id,
            instrument_id = %hedge.request().instrument_id,
            amount = %hedge.request().amount,
            "Hedge created"
        );
        Ok(hedge)
    }

    /// Attempt to place a pending hedge on the reference market.
    ///
    /// Terminal hedges are returned unchanged. Risk refusals and disabled
    /// hedging resolve the hedge as `failed` and return `Ok`. Reference
    /// market errors and timeouts resolve it as `failed` and return `Err`.
    ///
    /// # Errors
    ///
    /// [`HedgeError::External`], [`HedgeError::Timeout`], or a store failure.
    pub async fn execute(&self, hedge_id: &HedgeId) -> Result<HedgeOrder, HedgeError> {
        let Some(mut hedge) = self.store.get_hedge(hedge_id)? else {
            return Err(HedgeError::Store(format!("hedge {hedge_id} not found")));
        };
        if hedge.status().is_terminal() {
            return Ok(hedge);
        }

        let config = self.settings.snapshot();
        if !config.enabled {
            self.fail(&mut hedge, REASON_DISABLED)?;
            return Ok(hedge);
        }
        if self
            .mappings
            .resolve(hedge.market_id(), hedge.outcome_id())
            .is_none()
        {
            let err = HedgeError::Unmapped {
                market_id: hedge.market_id().to_string(),
                outcome_id: hedge.outcome_id().to_string(),
            };
            self.fail(&mut hedge, &err.to_string())?;
            return Ok(hedge);
        }

        hedge.record_attempt(Utc::now());
        if !self.store.update_hedge(&hedge, HedgeStatus::Pending)? {
            return self.current(hedge_id);
        }

        if let RiskCheckResult::Rejected(err) = self.risk.check(&hedge, &config)? {
            self.fail(&mut hedge, &err.to_string())?;
            return Ok(hedge);
        }

        let order = ExternalOrderRequest {
            instrument_id: hedge.request().instrument_id.clone(),
            side: hedge.request().side,
            size: hedge.request().size,
            price: hedge.request().price,
        };
        let timeout = Duration::from_millis(config.hedge_timeout_ms);
        let outcome = tokio::time::timeout(timeout, self.reference.place_order(&order)).await;

        let err = match outcome {
            Ok(Ok(ack)) => {
                let now = Utc::now();
                hedge.mark_placed(ack.external_order_id.clone(), ack.filled_size, now)?;
                if !self.store.update_hedge(&hedge, HedgeStatus::Pending)? {
                    warn!(
                        hedge_id = %hedge.id(),
                        external_order_id = %ack.external_order_id,
                        "Hedge resolved elsewhere before placement was recorded"
                    );
                    return self.current(hedge_id);
                }
                self.record_exposure(&hedge, now);
                info!(
                    hedge_id = %hedge.id(),
                    venue = self.reference.name(),
                    external_order_id = %ack.external_order_id,
                    filled_size = %ack.filled_size,
                    "Hedge placed"
                );
                return Ok(hedge);
            }
            Ok(Err(e)) => HedgeError::External(e.to_string()),
            Err(_) => HedgeError::Timeout {
                ms: config.hedge_timeout_ms,
            },
        };

        self.fail(&mut hedge, &err.to_string())?;
        Err(err)
    }

    fn fail(&self, hedge: &mut HedgeOrder, reason: &str) -> Result<(), HedgeError> {
        hedge.mark_failed(reason, Utc::now())?;
        if self.store.update_hedge(hedge, HedgeStatus::Pending)? {
            warn!(hedge_id = %hedge.id(), reason = %reason, "Hedge failed");
        }
        Ok(())
    }

    fn current(&self, hedge_id: &HedgeId) -> Result<HedgeOrder, HedgeError> {
        self.store
            .get_hedge(hedge_id)?
            .ok_or_else(|| HedgeError::Store(format!("hedge {hedge_id} not found")))
    }

    fn record_exposure(&self, hedge: &HedgeOrder, now: chrono::DateTime<Utc>) {
        let request = hedge.request();
        let delta = self.layouts.get(&request.market_id).and_then(|layout| {
            layout.exposure_delta(&request.outcome_id, request.side, hedge.hedged_notional())
        });
        if let Some((outcome_id, delta)) = delta {
            self.exposure
                .record_hedge(&request.market_id, &outcome_id, delta, now);
        }
    }
}

/// Limit price for the reference market: the fill price conceded by
/// `max_slippage_bps` against the house, kept inside (0, 1).
#[must_use]
pub fn hedge_price(fill_price: Price, side: Side, max_slippage_bps: u32) -> Price {
    let slippage = bps(max_slippage_bps);
    let price = match side {
        Side::Buy => fill_price * (Decimal::ONE + slippage),
        Side::Sell => fill_price * (Decimal::ONE - slippage),
    };
    price
        .round_dp(PRICE_SCALE)
        .clamp(BASIS_POINT, Decimal::ONE - BASIS_POINT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn hedge_price_concedes_slippage_in_trade_direction() {
        assert_eq!(hedge_price(dec!(0.5), Side::Buy, 100), dec!(0.505));
        assert_eq!(hedge_price(dec!(0.5), Side::Sell, 100), dec!(0.495));
    }

    #[test]
    fn hedge_price_stays_inside_unit_interval() {
        assert_eq!(hedge_price(dec!(0.9999), Side::Buy, 500), dec!(0.9999));
        assert_eq!(hedge_price(dec!(0.00001), Side::Sell, 500), dec!(0.0001));
    }
}
