//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod engine;
pub mod exposure;
pub mod hedge;
pub mod matching;
pub mod recovery;
pub mod risk;
pub mod scheduler;
