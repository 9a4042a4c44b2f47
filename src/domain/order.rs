//! Orders: resting or filled trade requests.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OrderId, OutcomeId, UserId};
use super::money::{Price, Volume, DUST};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy outcome shares with collateral.
    Buy,
    /// Sell outcome shares for collateral.
    Sell,
}

impl Side {
    /// The side a resting order must have to trade against this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Stable lowercase name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    /// Parse the stable name back into a side.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an order interacts with the book once matching stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Fill what is available now; never rests.
    Market,
    /// Fill up to the limit price; any remainder rests in the book.
    Limit,
}

impl OrderType {
    /// Stable lowercase name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
        }
    }

    /// Parse the stable name back into an order type.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "market" => Some(Self::Market),
            "limit" => Some(Self::Limit),
            _ => None,
        }
    }
}

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Still accepting fills (resting in the book).
    Open,
    /// Terminal; `filled` no longer changes.
    Closed,
}

impl OrderStatus {
    /// Stable lowercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parse the stable name back into a status.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// A trade request, either resting in the book or already matched.
///
/// `requested` and `filled` are notional amounts in collateral. The invariant
/// `filled <= requested` holds for the lifetime of the order, and `filled`
/// is frozen once the order is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    market_id: MarketId,
    outcome_id: OutcomeId,
    side: Side,
    order_type: OrderType,
    limit_price: Option<Price>,
    requested: Volume,
    filled: Volume,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    sequence: u64,
}

impl Order {
    /// Create a new open order with nothing filled.
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts and limit prices outside `(0, 1)`.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        id: OrderId,
        user_id: UserId,
        market_id: MarketId,
        outcome_id: OutcomeId,
        side: Side,
        order_type: OrderType,
        limit_price: Option<Price>,
        requested: Volume,
        created_at: DateTime<Utc>,
        sequence: u64,
    ) -> Result<Self, DomainError> {
        if requested <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount: requested });
        }
        if let Some(price) = limit_price {
            if price <= Decimal::ZERO || price >= Decimal::ONE {
                return Err(DomainError::InvalidPrice { price });
            }
        }
        Ok(Self {
            id,
            user_id,
            market_id,
            outcome_id,
            side,
            order_type,
            limit_price,
            requested,
            filled: Decimal::ZERO,
            status: OrderStatus::Open,
            created_at,
            sequence,
        })
    }

    /// Rebuild an order from persisted fields without re-running defaults.
    ///
    /// # Errors
    ///
    /// Rejects records where `filled > requested`.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        market_id: MarketId,
        outcome_id: OutcomeId,
        side: Side,
        order_type: OrderType,
        limit_price: Option<Price>,
        requested: Volume,
        filled: Volume,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        sequence: u64,
    ) -> Result<Self, DomainError> {
        if filled > requested {
            return Err(DomainError::Overfill {
                order_id: id.to_string(),
                amount: filled,
                remaining: requested,
            });
        }
        Ok(Self {
            id,
            user_id,
            market_id,
            outcome_id,
            side,
            order_type,
            limit_price,
            requested,
            filled,
            status,
            created_at,
            sequence,
        })
    }

    #[must_use]
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn outcome_id(&self) -> &OutcomeId {
        &self.outcome_id
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    #[must_use]
    pub const fn limit_price(&self) -> Option<Price> {
        self.limit_price
    }

    #[must_use]
    pub const fn requested(&self) -> Volume {
        self.requested
    }

    #[must_use]
    pub const fn filled(&self) -> Volume {
        self.filled
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Monotonic commit sequence, used to break creation-time ties.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Notional still open on the order.
    #[must_use]
    pub fn remaining(&self) -> Volume {
        self.requested - self.filled
    }

    /// Returns true while the order can still be filled.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Apply a fill, closing the order once nothing meaningful remains.
    ///
    /// # Errors
    ///
    /// Fails if the order is closed, the amount is not positive, or the
    /// fill would exceed the remaining amount.
    pub fn apply_fill(&mut self, amount: Volume) -> Result<(), DomainError> {
        if self.status == OrderStatus::Closed {
            return Err(DomainError::OrderClosed {
                order_id: self.id.to_string(),
            });
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount });
        }
        let remaining = self.remaining();
        if amount > remaining {
            return Err(DomainError::Overfill {
                order_id: self.id.to_string(),
                amount,
                remaining,
            });
        }
        self.filled += amount;
        if self.remaining() <= DUST {
            self.status = OrderStatus::Closed;
        }
        Ok(())
    }

    /// Close the order, freezing its filled amount.
    pub fn close(&mut self) {
        self.status = OrderStatus::Closed;
    }

    /// Shares still open at the limit price (`remaining / limit`).
    #[must_use]
    pub fn remaining_shares(&self) -> Option<Volume> {
        self.limit_price
            .filter(|price| *price > Decimal::ZERO)
            .map(|price| (self.remaining() / price).round_dp(super::money::AMOUNT_SCALE))
    }
}
