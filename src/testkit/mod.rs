//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`reference`]: `ScriptedReference`, a reference market that answers
//!   from a script of fills, partial fills, rejections, delays, and hangs.
//! - [`domain`]: Builders for markets, mappings, and trade requests.
//! - [`config`]: Canonical test configurations.
//! - [`harness`]: A fully wired engine over in-memory adapters.

pub mod config;
pub mod domain;
pub mod harness;
pub mod reference;
