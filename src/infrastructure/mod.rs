//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root: adapters, state restore, engine wiring
//! - [`config`] - Configuration loading and validation
//! - [`operator`] - Operator ports behind the command-line interface
//! - [`shutdown`] - Ctrl-C / SIGTERM handling for long-running commands

pub mod bootstrap;
pub mod config;
pub mod operator;
pub mod shutdown;
