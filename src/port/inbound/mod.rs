//! Inbound (driving) ports consumed by inbound adapters.
//!
//! - [`trade`]: trade requests and their execution results
//! - [`config`]: the hedge configuration value and its write allow-list
//! - [`risk`]: risk check results, dashboard and sweep read models
//! - [`operator`]: use-cases behind the command-line interface

pub mod config;
pub mod operator;
pub mod risk;
pub mod trade;
