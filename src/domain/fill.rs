//! Immutable trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{FillId, MarketId, OrderId, OutcomeId, UserId};
use super::money::{Price, Volume};
use super::order::Side;

/// Where a fill's liquidity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillSource {
    /// Traded against the automated market maker; moves curve quantities.
    Curve,
    /// Matched against a resting order; curve quantities are untouched.
    Book,
}

impl FillSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Curve => "curve",
            Self::Book => "book",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "curve" => Some(Self::Curve),
            "book" => Some(Self::Book),
            _ => None,
        }
    }
}

/// One match, appended once and never changed.
///
/// `amount` is collateral notional and `shares` the outcome shares that
/// changed hands, so `price == amount / shares` up to rounding. The side is
/// always the incoming (taker) order's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: FillId,
    pub order_id: OrderId,
    pub user_id: UserId,
    /// Resting order on the other side of a book fill.
    pub maker_order_id: Option<OrderId>,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub side: Side,
    pub source: FillSource,
    pub price: Price,
    pub amount: Volume,
    pub shares: Volume,
    /// Commit order across the engine; replay follows it.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Fill {
    #[must_use]
    pub fn is_curve(&self) -> bool {
        self.source == FillSource::Curve
    }
}
