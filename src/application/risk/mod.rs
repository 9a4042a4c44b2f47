//! Risk management service module.
//!
//! Provides hedge limit checks, exposure aggregation, risk snapshots, and
//! the dashboard read model.

pub mod manager;
