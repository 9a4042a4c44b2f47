//! SQLite persistence adapter.
//!
//! Stores orders, fills, hedge orders and risk snapshots using Diesel ORM.

pub mod database;
pub mod store;

pub use store::SqliteStore;
