//! Hybrid matching: resting book first, LMSR curve as the fallback.

pub mod matcher;
pub mod plan;

pub use matcher::{HybridMatcher, MatcherConfig};
