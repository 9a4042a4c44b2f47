//! SQLite store implementation.
//!
//! Provides persistent storage for orders, fills, hedge orders and risk
//! snapshots using SQLite and Diesel ORM.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    FillRow, HedgeOrderRow, OrderRow, RiskSnapshotRow,
};
use crate::adapter::outbound::sqlite::database::schema::{fills, hedge_orders, orders, risk_snapshots};
use crate::domain::fill::{Fill, FillSource};
use crate::domain::hedge::{HedgeOrder, HedgeRequest, HedgeStatus};
use crate::domain::id::{
    FillId, HedgeId, InstrumentId, MarketId, OrderId, OutcomeId, SnapshotId, UserId,
};
use crate::domain::order::{Order, OrderStatus, OrderType, Side};
use crate::domain::snapshot::RiskSnapshot;
use crate::error::{Error, Result};
use crate::port::outbound::store::{HedgeStore, SnapshotStore, TradeStore};

/// SQLite-backed store for every engine record.
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn order_to_row(order: &Order) -> OrderRow {
        OrderRow {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            market_id: order.market_id().to_string(),
            outcome_id: order.outcome_id().to_string(),
            side: order.side().as_str().to_string(),
            order_type: order.order_type().as_str().to_string(),
            limit_price: order.limit_price().map(|p| p.to_string()),
            requested: order.requested().to_string(),
            filled: order.filled().to_string(),
            status: order.status().as_str().to_string(),
            created_at: format_time(order.created_at()),
            sequence: to_i64(order.sequence()),
        }
    }

    fn order_from_row(row: OrderRow) -> Result<Order> {
        Ok(Order::restore(
            OrderId::new(row.id),
            UserId::new(row.user_id),
            MarketId::new(row.market_id),
            OutcomeId::new(row.outcome_id),
            parse_side(&row.side)?,
            OrderType::parse(&row.order_type)
                .ok_or_else(|| Error::Parse(format!("unknown order type: {}", row.order_type)))?,
            row.limit_price.as_deref().map(parse_decimal).transpose()?,
            parse_decimal(&row.requested)?,
            parse_decimal(&row.filled)?,
            OrderStatus::parse(&row.status)
                .ok_or_else(|| Error::Parse(format!("unknown order status: {}", row.status)))?,
            parse_time(&row.created_at)?,
            to_u64(row.sequence),
        )?)
    }

    fn fill_to_row(fill: &Fill) -> FillRow {
        FillRow {
            id: fill.id.to_string(),
            order_id: fill.order_id.to_string(),
            user_id: fill.user_id.to_string(),
            maker_order_id: fill.maker_order_id.as_ref().map(ToString::to_string),
            market_id: fill.market_id.to_string(),
            outcome_id: fill.outcome_id.to_string(),
            side: fill.side.as_str().to_string(),
            source: fill.source.as_str().to_string(),
            price: fill.price.to_string(),
            amount: fill.amount.to_string(),
            shares: fill.shares.to_string(),
            sequence: to_i64(fill.sequence),
            created_at: format_time(fill.created_at),
        }
    }

    fn fill_from_row(row: FillRow) -> Result<Fill> {
        Ok(Fill {
            id: FillId::new(row.id),
            order_id: OrderId::new(row.order_id),
            user_id: UserId::new(row.user_id),
            maker_order_id: row.maker_order_id.map(OrderId::new),
            market_id: MarketId::new(row.market_id),
            outcome_id: OutcomeId::new(row.outcome_id),
            side: parse_side(&row.side)?,
            source: FillSource::parse(&row.source)
                .ok_or_else(|| Error::Parse(format!("unknown fill source: {}", row.source)))?,
            price: parse_decimal(&row.price)?,
            amount: parse_decimal(&row.amount)?,
            shares: parse_decimal(&row.shares)?,
            sequence: to_u64(row.sequence),
            created_at: parse_time(&row.created_at)?,
        })
    }

    fn hedge_to_row(hedge: &HedgeOrder) -> HedgeOrderRow {
        let request = hedge.request();
        HedgeOrderRow {
            id: hedge.id().to_string(),
            fill_id: request.fill_id.to_string(),
            order_id: request.order_id.to_string(),
            market_id: request.market_id.to_string(),
            outcome_id: request.outcome_id.to_string(),
            instrument_id: request.instrument_id.to_string(),
            side: request.side.as_str().to_string(),
            price: request.price.to_string(),
            amount: request.amount.to_string(),
            size: request.size.to_string(),
            status: hedge.status().as_str().to_string(),
            external_order_id: hedge.external_order_id().map(str::to_string),
            filled_size: hedge.filled_size().to_string(),
            reason: hedge.reason().map(str::to_string),
            attempts: i32::try_from(hedge.attempts()).unwrap_or(i32::MAX),
            created_at: format_time(hedge.created_at()),
            updated_at: format_time(hedge.updated_at()),
            last_attempt_at: hedge.last_attempt_at().map(format_time),
        }
    }

    fn hedge_from_row(row: HedgeOrderRow) -> Result<HedgeOrder> {
        let request = HedgeRequest {
            fill_id: FillId::new(row.fill_id),
            order_id: OrderId::new(row.order_id),
            market_id: MarketId::new(row.market_id),
            outcome_id: OutcomeId::new(row.outcome_id),
            instrument_id: InstrumentId::new(row.instrument_id),
            side: parse_side(&row.side)?,
            price: parse_decimal(&row.price)?,
            amount: parse_decimal(&row.amount)?,
            size: parse_decimal(&row.size)?,
        };
        Ok(HedgeOrder::restore(
            HedgeId::new(row.id),
            request,
            HedgeStatus::parse(&row.status)
                .ok_or_else(|| Error::Parse(format!("unknown hedge status: {}", row.status)))?,
            row.external_order_id,
            parse_decimal(&row.filled_size)?,
            row.reason,
            u32::try_from(row.attempts).unwrap_or(0),
            parse_time(&row.created_at)?,
            parse_time(&row.updated_at)?,
            row.last_attempt_at.as_deref().map(parse_time).transpose()?,
        ))
    }

    fn snapshot_to_row(snapshot: &RiskSnapshot) -> RiskSnapshotRow {
        RiskSnapshotRow {
            id: snapshot.id.to_string(),
            total_unhedged: snapshot.total_unhedged.to_string(),
            total_hedged: snapshot.total_hedged.to_string(),
            open_positions: to_i64(snapshot.open_positions),
            recent_failures: to_i64(snapshot.recent_failures),
            failure_rate: snapshot.failure_rate,
            created_at: format_time(snapshot.created_at),
        }
    }

    fn snapshot_from_row(row: RiskSnapshotRow) -> Result<RiskSnapshot> {
        Ok(RiskSnapshot {
            id: SnapshotId::new(row.id),
            total_unhedged: parse_decimal(&row.total_unhedged)?,
            total_hedged: parse_decimal(&row.total_hedged)?,
            open_positions: to_u64(row.open_positions),
            recent_failures: to_u64(row.recent_failures),
            failure_rate: row.failure_rate,
            created_at: parse_time(&row.created_at)?,
        })
    }
}

impl TradeStore for SqliteStore {
    fn record_trade(&self, orders_batch: &[Order], fills_batch: &[Fill]) -> Result<()> {
        let order_rows: Vec<OrderRow> = orders_batch.iter().map(Self::order_to_row).collect();
        let fill_rows: Vec<FillRow> = fills_batch.iter().map(Self::fill_to_row).collect();
        let mut conn = self.conn()?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for row in &order_rows {
                diesel::replace_into(orders::table).values(row).execute(conn)?;
            }
            for row in &fill_rows {
                diesel::insert_into(fills::table).values(row).execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| Error::Database(e.to_string()))
    }

    fn get_order(&self, id: &OrderId) -> Result<Option<Order>> {
        let mut conn = self.conn()?;
        let row: Option<OrderRow> = orders::table
            .find(id.to_string())
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::order_from_row).transpose()
    }

    fn open_orders(&self) -> Result<Vec<Order>> {
        let mut conn = self.conn()?;
        let rows: Vec<OrderRow> = orders::table
            .filter(orders::status.eq(OrderStatus::Open.as_str()))
            .order((orders::created_at.asc(), orders::sequence.asc()))
            .select(OrderRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::order_from_row).collect()
    }

    fn fills_for_market(&self, market_id: &MarketId) -> Result<Vec<Fill>> {
        let mut conn = self.conn()?;
        let rows: Vec<FillRow> = fills::table
            .filter(fills::market_id.eq(market_id.as_str()))
            .order(fills::sequence.asc())
            .select(FillRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::fill_from_row).collect()
    }

    fn max_sequence(&self) -> Result<u64> {
        let mut conn = self.conn()?;
        let orders_max: Option<i64> = orders::table
            .select(diesel::dsl::max(orders::sequence))
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let fills_max: Option<i64> = fills::table
            .select(diesel::dsl::max(fills::sequence))
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(to_u64(orders_max.unwrap_or(0).max(fills_max.unwrap_or(0))))
    }
}

impl HedgeStore for SqliteStore {
    fn insert_hedge(&self, hedge: &HedgeOrder) -> Result<()> {
        let row = Self::hedge_to_row(hedge);
        let mut conn = self.conn()?;
        diesel::insert_into(hedge_orders::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    fn get_hedge(&self, id: &HedgeId) -> Result<Option<HedgeOrder>> {
        let mut conn = self.conn()?;
        let row: Option<HedgeOrderRow> = hedge_orders::table
            .find(id.to_string())
            .select(HedgeOrderRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::hedge_from_row).transpose()
    }

    fn update_hedge(&self, hedge: &HedgeOrder, expected: HedgeStatus) -> Result<bool> {
        let row = Self::hedge_to_row(hedge);
        let mut conn = self.conn()?;
        let updated = diesel::update(
            hedge_orders::table
                .filter(hedge_orders::id.eq(&row.id))
                .filter(hedge_orders::status.eq(expected.as_str())),
        )
        .set(&row)
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(updated == 1)
    }

    fn hedges_by_status(&self, status: HedgeStatus) -> Result<Vec<HedgeOrder>> {
        let mut conn = self.conn()?;
        let rows: Vec<HedgeOrderRow> = hedge_orders::table
            .filter(hedge_orders::status.eq(status.as_str()))
            .order(hedge_orders::created_at.asc())
            .select(HedgeOrderRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::hedge_from_row).collect()
    }

    fn list_hedges(&self) -> Result<Vec<HedgeOrder>> {
        let mut conn = self.conn()?;
        let rows: Vec<HedgeOrderRow> = hedge_orders::table
            .order(hedge_orders::created_at.asc())
            .select(HedgeOrderRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::hedge_from_row).collect()
    }

    fn failures_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<HedgeOrder>> {
        let mut conn = self.conn()?;
        let rows: Vec<HedgeOrderRow> = hedge_orders::table
            .filter(hedge_orders::status.eq(HedgeStatus::Failed.as_str()))
            .filter(hedge_orders::updated_at.ge(format_time(since)))
            .order(hedge_orders::updated_at.desc())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(HedgeOrderRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::hedge_from_row).collect()
    }
}

impl SnapshotStore for SqliteStore {
    fn save_snapshot(&self, snapshot: &RiskSnapshot) -> Result<()> {
        let row = Self::snapshot_to_row(snapshot);
        let mut conn = self.conn()?;
        diesel::insert_into(risk_snapshots::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    fn recent_snapshots(&self, limit: usize) -> Result<Vec<RiskSnapshot>> {
        let mut conn = self.conn()?;
        let rows: Vec<RiskSnapshotRow> = risk_snapshots::table
            .order(risk_snapshots::created_at.desc())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(RiskSnapshotRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let mut snapshots = rows
            .into_iter()
            .map(Self::snapshot_from_row)
            .collect::<Result<Vec<_>>>()?;
        snapshots.reverse();
        Ok(snapshots)
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| Error::Parse(e.to_string()))?
        .with_timezone(&Utc))
}

fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Error::Parse(format!("{value}: {e}")))
}

fn parse_side(value: &str) -> Result<Side> {
    Side::parse(value).ok_or_else(|| Error::Parse(format!("unknown side: {value}")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
