//! Point-in-time risk aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::SnapshotId;
use super::money::Volume;

/// Aggregate risk captured by the snapshot job. Never modified once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub id: SnapshotId,
    pub total_unhedged: Volume,
    pub total_hedged: Volume,
    /// Hedges still pending when the snapshot was taken.
    pub open_positions: u64,
    /// Hedges that failed inside the recent-failure window.
    pub recent_failures: u64,
    /// `recent_failures` over all hedges resolved in the same window.
    pub failure_rate: f64,
    pub created_at: DateTime<Utc>,
}
