//! Database model types for Diesel ORM.
//!
//! Decimals and timestamps are stored as text: decimals in their exact
//! string form, timestamps as RFC 3339 UTC with microseconds so they sort
//! lexically.

use diesel::prelude::*;

use super::schema::{fills, hedge_orders, orders, risk_snapshots};

/// Database row for an order.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub market_id: String,
    pub outcome_id: String,
    pub side: String,
    pub order_type: String,
    pub limit_price: Option<String>,
    pub requested: String,
    pub filled: String,
    pub status: String,
    pub created_at: String,
    pub sequence: i64,
}

/// Database row for a fill. Fills are append-only.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = fills)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FillRow {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub maker_order_id: Option<String>,
    pub market_id: String,
    pub outcome_id: String,
    pub side: String,
    pub source: String,
    pub price: String,
    pub amount: String,
    pub shares: String,
    pub sequence: i64,
    pub created_at: String,
}

/// Database row for a hedge order.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = hedge_orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct HedgeOrderRow {
    pub id: String,
    pub fill_id: String,
    pub order_id: String,
    pub market_id: String,
    pub outcome_id: String,
    pub instrument_id: String,
    pub side: String,
    pub price: String,
    pub amount: String,
    pub size: String,
    pub status: String,
    pub external_order_id: Option<String>,
    pub filled_size: String,
    pub reason: Option<String>,
    pub attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub last_attempt_at: Option<String>,
}

/// Database row for a risk snapshot.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = risk_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RiskSnapshotRow {
    pub id: String,
    pub total_unhedged: String,
    pub total_hedged: String,
    pub open_positions: i64,
    pub recent_failures: i64,
    pub failure_rate: f64,
    pub created_at: String,
}
