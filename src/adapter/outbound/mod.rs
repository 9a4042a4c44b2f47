//! Outbound adapters (driven side).

pub mod ledger;
pub mod memory;
pub mod reference;
pub mod sqlite;
