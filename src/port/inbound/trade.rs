//! Trade request and execution types exposed to inbound adapters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::fill::Fill;
use crate::domain::id::{HedgeId, MarketId, OutcomeId, UserId};
use crate::domain::money::{Price, Volume};
use crate::domain::order::{Order, OrderType, Side};

/// An incoming trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub side: Side,
    /// Collateral notional to trade.
    pub amount: Volume,
    /// Worst acceptable price. Required for limit orders, optional
    /// protection for market orders.
    #[serde(default)]
    pub limit_price: Option<Price>,
    pub order_type: OrderType,
}

/// Outcome of a committed trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeExecution {
    pub order: Order,
    pub fills: Vec<Fill>,
    /// Notional filled across all fills.
    pub filled: Volume,
    /// Volume-weighted average price (`filled / shares`), if anything filled.
    pub average_price: Option<Price>,
    /// Notional not filled. Rests in the book for limit orders; dropped for
    /// market orders.
    pub remainder: Volume,
    /// Whether the remainder rests in the book.
    pub rested: bool,
    pub price_before: f64,
    pub price_after: f64,
    /// Hedges created for the curve fills of this trade.
    pub hedge_ids: Vec<HedgeId>,
}

impl TradeExecution {
    #[must_use]
    pub fn shares(&self) -> Decimal {
        self.fills.iter().map(|fill| fill.shares).sum()
    }
}
