//! Risk check results and the read models behind the risk dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::hedge::HedgeStatus;
use crate::domain::id::{HedgeId, MarketId};
use crate::domain::snapshot::RiskSnapshot;
use crate::error::HedgeError;

/// Result of a risk check for a proposed hedge.
#[derive(Debug, Clone)]
pub enum RiskCheckResult {
    /// Hedge passes all limits and may be placed.
    Approved,

    /// Hedge must not be placed.
    Rejected(HedgeError),
}

impl RiskCheckResult {
    /// Return `true` if the hedge is approved.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, RiskCheckResult::Approved)
    }

    /// Return the rejection error if the hedge was rejected.
    #[must_use]
    pub const fn rejection_error(&self) -> Option<&HedgeError> {
        match self {
            RiskCheckResult::Rejected(e) => Some(e),
            RiskCheckResult::Approved => None,
        }
    }
}

/// Per-market slice of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRisk {
    pub market_id: MarketId,
    pub net_exposure: Decimal,
    pub unhedged: Decimal,
    pub hedged_amount: Decimal,
    pub pending: u64,
    pub placed: u64,
    pub failed: u64,
    pub last_hedge_at: Option<DateTime<Utc>>,
}

/// A recent hedge failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSummary {
    pub hedge_id: HedgeId,
    pub market_id: MarketId,
    pub amount: Decimal,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Aggregated hedge and exposure view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDashboard {
    pub total_hedges: u64,
    pub placed: u64,
    pub failed: u64,
    pub pending: u64,
    /// `placed / (placed + failed)`; zero before anything resolves.
    pub success_rate: f64,
    pub net_exposure: Decimal,
    pub unhedged_exposure: Decimal,
    pub hedged_amount: Decimal,
    /// Notional of pending hedges.
    pub pending_exposure: Decimal,
    pub markets: Vec<MarketRisk>,
    pub recent_failures: Vec<FailureSummary>,
    pub snapshots: Vec<RiskSnapshot>,
    /// Reference market errors and timeouts seen by the worker pool.
    pub external_failures_total: u64,
}

impl RiskDashboard {
    /// Count of hedges in one status.
    #[must_use]
    pub const fn count(&self, status: HedgeStatus) -> u64 {
        match status {
            HedgeStatus::Pending => self.pending,
            HedgeStatus::Placed => self.placed,
            HedgeStatus::Failed => self.failed,
        }
    }
}

/// Result of one recovery sweep pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Pending hedges older than the stuck threshold.
    pub stuck: u64,
    /// Stuck hedges resubmitted to the worker pool.
    pub requeued: u64,
    /// Hedges forced to failed for exceeding the long threshold.
    pub forced_failures: u64,
    /// Aggregate pending notional after the pass.
    pub current_exposure: Decimal,
}
