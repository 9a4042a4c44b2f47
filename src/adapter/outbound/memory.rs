//! In-memory store, used when no database is configured and in tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::fill::Fill;
use crate::domain::hedge::{HedgeOrder, HedgeStatus};
use crate::domain::id::{HedgeId, MarketId, OrderId};
use crate::domain::order::Order;
use crate::domain::snapshot::RiskSnapshot;
use crate::error::Result;
use crate::port::outbound::store::{HedgeStore, SnapshotStore, TradeStore};

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    fills: Vec<Fill>,
    hedges: HashMap<HedgeId, HedgeOrder>,
    snapshots: Vec<RiskSnapshot>,
}

/// Process-local store behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TradeStore for MemoryStore {
    fn record_trade(&self, orders: &[Order], fills: &[Fill]) -> Result<()> {
        let mut tables = self.tables.write();
        for order in orders {
            tables.orders.insert(order.id().clone(), order.clone());
        }
        tables.fills.extend_from_slice(fills);
        Ok(())
    }

    fn get_order(&self, id: &OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().orders.get(id).cloned())
    }

    fn open_orders(&self) -> Result<Vec<Order>> {
        let mut open: Vec<Order> = self
            .tables
            .read()
            .orders
            .values()
            .filter(|order| order.is_open())
            .cloned()
            .collect();
        open.sort_by_key(|order| (order.created_at(), order.sequence()));
        Ok(open)
    }

    fn fills_for_market(&self, market_id: &MarketId) -> Result<Vec<Fill>> {
        let mut fills: Vec<Fill> = self
            .tables
            .read()
            .fills
            .iter()
            .filter(|fill| &fill.market_id == market_id)
            .cloned()
            .collect();
        fills.sort_by_key(|fill| fill.sequence);
        Ok(fills)
    }

    fn max_sequence(&self) -> Result<u64> {
        let tables = self.tables.read();
        let fills = tables.fills.iter().map(|fill| fill.sequence);
        let orders = tables.orders.values().map(Order::sequence);
        Ok(fills.chain(orders).max().unwrap_or(0))
    }
}

impl HedgeStore for MemoryStore {
    fn insert_hedge(&self, hedge: &HedgeOrder) -> Result<()> {
        self.tables
            .write()
            .hedges
            .insert(hedge.id().clone(), hedge.clone());
        Ok(())
    }

    fn get_hedge(&self, id: &HedgeId) -> Result<Option<HedgeOrder>> {
        Ok(self.tables.read().hedges.get(id).cloned())
    }

    fn update_hedge(&self, hedge: &HedgeOrder, expected: HedgeStatus) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.hedges.get_mut(hedge.id()) {
            Some(current) if current.status() == expected => {
                *current = hedge.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn hedges_by_status(&self, status: HedgeStatus) -> Result<Vec<HedgeOrder>> {
        let mut hedges: Vec<HedgeOrder> = self
            .tables
            .read()
            .hedges
            .values()
            .filter(|hedge| hedge.status() == status)
            .cloned()
            .collect();
        hedges.sort_by_key(HedgeOrder::created_at);
        Ok(hedges)
    }

    fn list_hedges(&self) -> Result<Vec<HedgeOrder>> {
        let mut hedges: Vec<HedgeOrder> = self.tables.read().hedges.values().cloned().collect();
        hedges.sort_by_key(HedgeOrder::created_at);
        Ok(hedges)
    }

    fn failures_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<HedgeOrder>> {
        let mut failed: Vec<HedgeOrder> = self
            .tables
            .read()
            .hedges
            .values()
            .filter(|hedge| hedge.status() == HedgeStatus::Failed && hedge.updated_at() >= since)
            .cloned()
            .collect();
        failed.sort_by_key(|hedge| std::cmp::Reverse(hedge.updated_at()));
        failed.truncate(limit);
        Ok(failed)
    }
}

impl SnapshotStore for MemoryStore {
    fn save_snapshot(&self, snapshot: &RiskSnapshot) -> Result<()> {
        self.tables.write().snapshots.push(snapshot.clone());
        Ok(())
    }

    fn recent_snapshots(&self, limit: usize) -> Result<Vec<RiskSnapshot>> {
        let tables = self.tables.read();
        let mut snapshots = tables.snapshots.clone();
        snapshots.sort_by_key(|snapshot| snapshot.created_at);
        let skip = snapshots.len().saturating_sub(limit);
        Ok(snapshots.split_off(skip))
    }
}
