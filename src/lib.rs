//! Hedgeline - hybrid pricing, matching, and hedge replication engine.
//!
//! Trades are matched against a resting limit order book and an LMSR
//! automated market maker, whichever is better at each step. Every fill
//! against the market maker is replicated onto an external reference market
//! so the house's directional exposure stays bounded.
//!
//! # Architecture
//!
//! - [`domain`] - Pure types and rules: the LMSR curve, markets, orders, the
//!   order book, fills, hedge orders, exposure, risk snapshots
//! - [`port`] - Traits at the seams: ledger, reference market, stores
//! - [`application`] - Use cases: hybrid matcher, hedge dispatcher and worker
//!   pool, risk manager, recovery sweep, scheduler, engine facade
//! - [`adapter`] - Implementations: in-memory and SQLite stores, HTTP and
//!   paper reference markets, HTTP API (axum), CLI (clap)
//! - [`infrastructure`] - Configuration, logging, and the composition root
//!
//! # Features
//!
//! - `testkit` - Scripted test doubles and builders for integration tests
//!
//! # Example
//!
//! ```no_run
//! use hedgeline::infrastructure::bootstrap::bootstrap;
//! use hedgeline::infrastructure::config::settings::Config;
//!
//! # async fn run() -> hedgeline::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let assembly = bootstrap(&config)?;
//! let dashboard = assembly.engine().dashboard()?;
//! println!("{} hedges", dashboard.total_hedges);
//! assembly.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
