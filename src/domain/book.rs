//! Resting limit orders for one market, kept in price-time priority.
//!
//! Each (outcome, side) pair has its own ladder of price levels. Buy ladders
//! are read highest price first, sell ladders lowest price first, and every
//! level is a FIFO queue ordered by creation time then commit sequence.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::error::DomainError;
use super::id::{MarketId, OrderId, OutcomeId};
use super::money::{Price, Volume};
use super::order::{Order, Side};

type Ladder = BTreeMap<Price, VecDeque<Order>>;

/// Open limit orders of a single market.
#[derive(Debug, Clone)]
pub struct OrderBook {
    market_id: MarketId,
    ladders: HashMap<(OutcomeId, Side), Ladder>,
    index: HashMap<OrderId, (OutcomeId, Side, Price)>,
}

impl OrderBook {
    #[must_use]
    pub fn new(market_id: MarketId) -> Self {
        Self {
            market_id,
            ladders: HashMap::new(),
            index: HashMap::new(),
        }
    }

    /// Rebuild a book from persisted open orders.
    ///
    /// # Errors
    ///
    /// Fails if any order cannot rest (closed, or missing a limit price).
    pub fn from_orders(
        market_id: MarketId,
        orders: impl IntoIterator<Item = Order>,
    ) -> Result<Self, DomainError> {
        let mut book = Self::new(market_id);
        for order in orders {
            book.insert(order)?;
        }
        Ok(book)
    }

    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Add a resting order at its limit price, behind every order that was
    /// created earlier at the same price.
    ///
    /// # Errors
    ///
    /// Closed orders and orders without a limit price cannot rest.
    pub fn insert(&mut self, order: Order) -> Result<(), DomainError> {
        if !order.is_open() {
            return Err(DomainError::OrderClosed {
                order_id: order.id().to_string(),
            });
        }
        let Some(price) = order.limit_price() else {
            return Err(DomainError::MissingLimitPrice {
                order_id: order.id().to_string(),
            });
        };

        let key = (order.outcome_id().clone(), order.side());
        self.index
            .insert(order.id().clone(), (key.0.clone(), key.1, price));

        let queue = self.ladders.entry(key).or_default().entry(price).or_default();
        let priority = (order.created_at(), order.sequence());
        let position = queue
            .iter()
            .position(|resting| (resting.created_at(), resting.sequence()) > priority)
            .unwrap_or(queue.len());
        queue.insert(position, order);
        Ok(())
    }

    /// Open orders on one side of an outcome, best price first, then FIFO.
    #[must_use]
    pub fn orders_by_priority(&self, outcome_id: &OutcomeId, side: Side) -> Vec<&Order> {
        let Some(ladder) = self.ladders.get(&(outcome_id.clone(), side)) else {
            return Vec::new();
        };
        let levels: Box<dyn Iterator<Item = &VecDeque<Order>> + '_> = match side {
            Side::Buy => Box::new(ladder.values().rev()),
            Side::Sell => Box::new(ladder.values()),
        };
        levels.flat_map(|queue| queue.iter()).collect()
    }

    /// Highest-priority open order on one side of an outcome.
    #[must_use]
    pub fn best(&self, outcome_id: &OutcomeId, side: Side) -> Option<&Order> {
        let ladder = self.ladders.get(&(outcome_id.clone(), side))?;
        let level = match side {
            Side::Buy => ladder.values().next_back(),
            Side::Sell => ladder.values().next(),
        }?;
        level.front()
    }

    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        let (outcome_id, side, price) = self.index.get(order_id)?;
        self.ladders
            .get(&(outcome_id.clone(), *side))?
            .get(price)?
            .iter()
            .find(|order| order.id() == order_id)
    }

    /// Decrement a resting order by `amount` of notional.
    ///
    /// Returns the order after the fill. Orders that close are removed from
    /// the book.
    ///
    /// # Errors
    ///
    /// Fails for unknown orders or fills larger than the remaining amount;
    /// the book is unchanged in that case.
    pub fn fill(&mut self, order_id: &OrderId, amount: Volume) -> Result<Order, DomainError> {
        let Some((outcome_id, side, price)) = self.index.get(order_id).cloned() else {
            return Err(DomainError::OrderClosed {
                order_id: order_id.to_string(),
            });
        };
        let key = (outcome_id, side);
        let Some(queue) = self.ladders.get_mut(&key).and_then(|l| l.get_mut(&price)) else {
            return Err(DomainError::OrderClosed {
                order_id: order_id.to_string(),
            });
        };
        let Some(position) = queue.iter().position(|order| order.id() == order_id) else {
            return Err(DomainError::OrderClosed {
                order_id: order_id.to_string(),
            });
        };

        queue[position].apply_fill(amount)?;
        let updated = queue[position].clone();
        if !updated.is_open() {
            queue.remove(position);
            self.index.remove(order_id);
            if queue.is_empty() {
                if let Some(ladder) = self.ladders.get_mut(&key) {
                    ladder.remove(&price);
                }
            }
        }
        Ok(updated)
    }

    /// Every open order in the book, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.ladders
            .values()
            .flat_map(|ladder| ladder.values())
            .flat_map(|queue| queue.iter())
    }
}
