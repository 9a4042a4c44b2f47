//! One-shot maintenance use-cases run against the configured store.

use crate::domain::snapshot::RiskSnapshot;
use crate::error::Result;
use crate::port::inbound::risk::{RiskDashboard, SweepSummary};

/// Maintenance use-cases for operator-facing adapters.
///
/// These run without a worker pool, so a sweep never requeues.
pub trait MaintenanceOperator: Send + Sync {
    /// Run one recovery pass.
    fn sweep(&self, config_toml: &str) -> Result<SweepSummary>;

    /// Persist one risk snapshot.
    fn snapshot(&self, config_toml: &str) -> Result<RiskSnapshot>;

    /// Build the risk dashboard.
    fn dashboard(&self, config_toml: &str) -> Result<RiskDashboard>;
}
