//! Inbound adapters (driving side).

pub mod api;
pub mod cli;
