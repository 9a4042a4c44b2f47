//! Persistence ports for orders, fills, hedges, and risk snapshots.
//!
//! These are synchronous: the SQLite adapter runs short local transactions
//! and the in-memory adapter never blocks.

use chrono::{DateTime, Utc};

use crate::domain::fill::Fill;
use crate::domain::hedge::{HedgeOrder, HedgeStatus};
use crate::domain::id::{HedgeId, MarketId, OrderId};
use crate::domain::order::Order;
use crate::domain::snapshot::RiskSnapshot;
use crate::error::Result;

/// Storage for orders and the append-only fill log.
pub trait TradeStore: Send + Sync {
    /// Upsert the orders touched by one match and append its fills, atomically.
    fn record_trade(&self, orders: &[Order], fills: &[Fill]) -> Result<()>;

    /// Get an order by ID.
    fn get_order(&self, id: &OrderId) -> Result<Option<Order>>;

    /// Every open order, ordered by creation time then sequence.
    fn open_orders(&self) -> Result<Vec<Order>>;

    /// Fills of one market in commit order.
    fn fills_for_market(&self, market_id: &MarketId) -> Result<Vec<Fill>>;

    /// Highest commit sequence persisted so far (0 when empty).
    fn max_sequence(&self) -> Result<u64>;
}

/// Storage for hedge orders.
pub trait HedgeStore: Send + Sync {
    /// Insert a new hedge.
    fn insert_hedge(&self, hedge: &HedgeOrder) -> Result<()>;

    /// Get a hedge by ID.
    fn get_hedge(&self, id: &HedgeId) -> Result<Option<HedgeOrder>>;

    /// Overwrite a hedge only if its stored status still equals `expected`.
    ///
    /// Returns false when another writer moved it first.
    fn update_hedge(&self, hedge: &HedgeOrder, expected: HedgeStatus) -> Result<bool>;

    /// Hedges in one status, oldest first.
    fn hedges_by_status(&self, status: HedgeStatus) -> Result<Vec<HedgeOrder>>;

    /// Every hedge, oldest first.
    fn list_hedges(&self) -> Result<Vec<HedgeOrder>>;

    /// Failed hedges updated at or after `since`, newest first.
    fn failures_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<HedgeOrder>>;
}

/// Storage for risk snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot.
    fn save_snapshot(&self, snapshot: &RiskSnapshot) -> Result<()>;

    /// The latest `limit` snapshots, oldest first.
    fn recent_snapshots(&self, limit: usize) -> Result<Vec<RiskSnapshot>>;
}

/// Everything the engine persists.
pub trait Store: TradeStore + HedgeStore + SnapshotStore {}

impl<T: TradeStore + HedgeStore + SnapshotStore> Store for T {}
