//! Exchange-agnostic domain logic.
//!
//! Pure types and rules with no I/O: the pricing curve, markets, orders and
//! the resting book, fills, hedge orders, exposure, and risk snapshots.

pub mod book;
pub mod curve;
pub mod error;
pub mod exposure;
pub mod fill;
pub mod hedge;
pub mod id;
pub mod mapping;
pub mod market;
pub mod money;
pub mod order;
pub mod snapshot;
