//! Hybrid matcher: the synchronous trade path.
//!
//! Every market sits behind its own async mutex, so trades on one market are
//! committed strictly in order while different markets proceed in parallel.
//! A trade is planned on copies of the book and curve, then the ledger batch
//! is applied. Only when the ledger accepts it are the new book and curve
//! swapped in, so a rejected balance leaves no trace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::plan::{plan, MatchPlan, PlannedFill, Taker};
use crate::application::exposure::ExposureLedger;
use crate::domain::book::OrderBook;
use crate::domain::fill::Fill;
use crate::domain::id::{FillId, MarketId, OrderId};
use crate::domain::market::{Market, MarketLayout};
use crate::domain::money::{Volume, AMOUNT_SCALE, DUST};
use crate::domain::order::{Order, OrderType, Side};
use crate::error::TradeError;
use crate::port::inbound::trade::{TradeExecution, TradeRequest};
use crate::port::outbound::ledger::{share_token, Ledger, LedgerEntry};
use crate::port::outbound::store::Store;

/// Trade path limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Largest notional accepted in a single order.
    pub max_order_size: Decimal,
    /// Ledger token used as collateral.
    pub collateral_token: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_order_size: Decimal::from(10_000),
            collateral_token: "USDC".to_string(),
        }
    }
}

struct MarketSlot {
    market: Market,
    book: OrderBook,
}

/// Matches trades against resting orders and the LMSR curve.
pub struct HybridMatcher {
    markets: DashMap<MarketId, Arc<Mutex<MarketSlot>>>,
    ledger: Arc<dyn Ledger>,
    store: Arc<dyn Store>,
    exposure: Arc<ExposureLedger>,
    sequence: AtomicU64,
    config: MatcherConfig,
}

impl HybridMatcher {
    pub fn new(
        config: MatcherConfig,
        ledger: Arc<dyn Ledger>,
        store: Arc<dyn Store>,
        exposure: Arc<ExposureLedger>,
    ) -> Self {
        Self {
            markets: DashMap::new(),
            ledger,
            store,
            exposure,
            sequence: AtomicU64::new(0),
            config,
        }
    }

    /// Continue the commit sequence after `last`, as recovered from the store.
    pub fn resume_sequence(&self, last: u64) {
        self.sequence.fetch_max(last, Ordering::SeqCst);
    }

    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub const fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Add a market with its resting book. Replaces any market with the same id.
    pub fn register(&self, market: Market, book: OrderBook) {
        info!(
            market_id = %market.id(),
            outcomes = market.outcomes().len(),
            liquidity = market.curve().liquidity(),
            resting = book.len(),
            "Market registered"
        );
        self.markets
            .insert(market.id().clone(), Arc::new(Mutex::new(MarketSlot { market, book })));
    }

    #[must_use]
    pub fn market_ids(&self) -> Vec<MarketId> {
        let mut ids: Vec<MarketId> = self.markets.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    fn slot(&self, market_id: &MarketId) -> Option<Arc<Mutex<MarketSlot>>> {
        self.markets.get(market_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Copy of a market's current state.
    pub async fn market(&self, market_id: &MarketId) -> Option<Market> {
        let slot = self.slot(market_id)?;
        let guard = slot.lock().await;
        Some(guard.market.clone())
    }

    /// Number of resting orders in a market.
    pub async fn resting_orders(&self, market_id: &MarketId) -> Option<usize> {
        let slot = self.slot(market_id)?;
        let guard = slot.lock().await;
        Some(guard.book.len())
    }

    /// Outcome layouts of every registered market.
    pub async fn layouts(&self) -> HashMap<MarketId, MarketLayout> {
        let mut layouts = HashMap::new();
        for market_id in self.market_ids() {
            if let Some(market) = self.market(&market_id).await {
                layouts.insert(market_id, market.layout());
            }
        }
        layouts
    }

    /// Reset a binary market's curve to an observed external YES price.
    ///
    /// # Errors
    ///
    /// Unknown markets and multi-outcome markets are rejected.
    pub async fn reconcile(&self, market_id: &MarketId, yes_price: f64) -> Result<(), TradeError> {
        let slot = self.slot(market_id).ok_or_else(|| TradeError::UnknownMarket {
            market_id: market_id.to_string(),
        })?;
        let mut guard = slot.lock().await;
        guard.market.reconcile_binary(yes_price)?;
        info!(market_id = %market_id, yes_price, "Curve reconciled to external price");
        Ok(())
    }

    /// Validate, match, and commit one trade.
    ///
    /// # Errors
    ///
    /// Every error is raised before any state changes: validation failures,
    /// unknown markets or outcomes, market orders that find no liquidity, and
    /// ledger rejections.
    pub async fn execute(&self, request: &TradeRequest) -> Result<TradeExecution, TradeError> {
        self.validate(request)?;
        let slot = self.slot(&request.market_id).ok_or_else(|| TradeError::UnknownMarket {
            market_id: request.market_id.to_string(),
        })?;

        let mut guard = slot.lock().await;
        let outcome = guard
            .market
            .outcome_index(&request.outcome_id)
            .ok_or_else(|| TradeError::UnknownOutcome {
                market_id: request.market_id.to_string(),
                outcome_id: request.outcome_id.to_string(),
            })?;

        let now = Utc::now();
        let mut order = Order::try_new(
            OrderId::generate(),
            request.user_id.clone(),
            request.market_id.clone(),
            request.outcome_id.clone(),
            request.side,
            request.order_type,
            request.limit_price,
            request.amount,
            now,
            self.next_sequence(),
        )?;

        let mut staged = plan(
            &guard.market,
            &guard.book,
            Taker {
                outcome_id: &request.outcome_id,
                outcome,
                side: request.side,
                limit: request.limit_price,
                amount: request.amount,
            },
        )?;

        if staged.filled <= Decimal::ZERO && request.order_type == OrderType::Market {
            return Err(TradeError::InsufficientLiquidity {
                market_id: request.market_id.to_string(),
            });
        }

        let fills = self.materialize(&order, &staged, now);
        for fill in &fills {
            order.apply_fill(fill.amount)?;
        }

        let remainder = staged.remainder(request.amount);
        let rests = request.order_type == OrderType::Limit && order.is_open() && remainder > DUST;
        if rests {
            staged.book.insert(order.clone())?;
        } else {
            order.close();
        }

        let entries = self.ledger_entries(&order, &staged.fills, &fills, rests);
        self.ledger.apply(&entries).await?;

        // Committed: nothing below may reject the trade.
        let mut touched: Vec<Order> = vec![order.clone()];
        touched.extend(
            staged
                .fills
                .iter()
                .filter_map(|planned| planned.maker.clone()),
        );
        guard.book = staged.book;
        guard.market.set_quantities(&staged.quantities);
        let layout = guard.market.layout();

        // Order rows are overwritten whole, so writes must land in commit order.
        if let Err(e) = self.store.record_trade(&touched, &fills) {
            error!(order_id = %order.id(), error = %e, "Failed to persist committed trade");
        }
        drop(guard);

        for fill in fills.iter().filter(|fill| fill.is_curve()) {
            if let Some((outcome_id, delta)) =
                layout.exposure_delta(&fill.outcome_id, fill.side, fill.amount)
            {
                self.exposure.record_fill(&fill.market_id, &outcome_id, delta);
            }
        }

        let filled: Volume = fills.iter().map(|fill| fill.amount).sum();
        let shares: Volume = fills.iter().map(|fill| fill.shares).sum();
        let average_price = (shares > Decimal::ZERO).then(|| (filled / shares).round_dp(AMOUNT_SCALE));

        info!(
            order_id = %order.id(),
            user_id = %order.user_id(),
            market_id = %order.market_id(),
            outcome_id = %order.outcome_id(),
            side = %order.side(),
            filled = %filled,
            fills = fills.len(),
            rested = rests,
            price_before = staged.price_before,
            price_after = staged.price_after,
            "Trade committed"
        );

        Ok(TradeExecution {
            order,
            fills,
            filled,
            average_price,
            remainder,
            rested: rests,
            price_before: staged.price_before,
            price_after: staged.price_after,
            hedge_ids: Vec::new(),
        })
    }

    fn validate(&self, request: &TradeRequest) -> Result<(), TradeError> {
        if request.amount <= Decimal::ZERO {
            return Err(TradeError::InvalidAmount {
                amount: request.amount,
            });
        }
        if let Some(price) = request.limit_price {
            if price <= Decimal::ZERO || price >= Decimal::ONE {
                return Err(TradeError::InvalidPrice { price });
            }
        }
        if request.order_type == OrderType::Limit && request.limit_price.is_none() {
            return Err(TradeError::MissingLimitPrice);
        }
        if request.amount > self.config.max_order_size {
            return Err(TradeError::OrderTooLarge {
                amount: request.amount,
                max: self.config.max_order_size,
            });
        }
        Ok(())
    }

    fn materialize(&self, order: &Order, plan: &MatchPlan, now: chrono::DateTime<Utc>) -> Vec<Fill> {
        plan.fills
            .iter()
            .map(|planned| Fill {
                id: FillId::generate(),
                order_id: order.id().clone(),
                user_id: order.user_id().clone(),
                maker_order_id: planned.maker.as_ref().map(|maker| maker.id().clone()),
                market_id: order.market_id().clone(),
                outcome_id: order.outcome_id().clone(),
                side: order.side(),
                source: planned.source,
                price: planned.price,
                amount: planned.amount,
                shares: planned.shares,
                sequence: self.next_sequence(),
                created_at: now,
            })
            .collect()
    }

    /// Balance changes for a trade: the taker pays and receives per fill,
    /// resting makers receive the counter-asset, and a resting remainder is
    /// escrowed.
    fn ledger_entries(
        &self,
        order: &Order,
        planned: &[PlannedFill],
        fills: &[Fill],
        rests: bool,
    ) -> Vec<LedgerEntry> {
        let collateral = self.config.collateral_token.as_str();
        let shares_token = share_token(order.market_id(), order.outcome_id());
        let taker = order.user_id().clone();
        let mut entries = Vec::with_capacity(fills.len() * 2 + 2);

        for (planned, fill) in planned.iter().zip(fills) {
            match order.side() {
                Side::Buy => {
                    entries.push(LedgerEntry::debit(taker.clone(), collateral, fill.amount));
                    entries.push(LedgerEntry::credit(taker.clone(), &shares_token, fill.shares));
                }
                Side::Sell => {
                    entries.push(LedgerEntry::debit(taker.clone(), &shares_token, fill.shares));
                    entries.push(LedgerEntry::credit(taker.clone(), collateral, fill.amount));
                }
            }
            if let Some(maker) = &planned.maker {
                // Makers escrowed their side when they rested.
                let (token, amount) = match order.side() {
                    Side::Buy => (collateral.to_string(), fill.amount),
                    Side::Sell => (shares_token.clone(), fill.shares),
                };
                entries.push(LedgerEntry::credit(maker.user_id().clone(), token, amount));
            }
        }

        if rests {
            match order.side() {
                Side::Buy => entries.push(LedgerEntry::debit(taker, collateral, order.remaining())),
                Side::Sell => {
                    if let Some(shares) = order.remaining_shares() {
                        entries.push(LedgerEntry::debit(taker, &shares_token, shares));
                    }
                }
            }
        }

        debug!(order_id = %order.id(), entries = entries.len(), "Ledger batch prepared");
        entries
    }
}
