//! Recovery sweep for hedges stuck in `pending`.
//!
//! A pending hedge older than `stuck_after` is stuck. A stuck hedge whose
//! last attempt is also older than `stuck_after` is requeued while it has
//! attempts left. Once older than `fail_after` it is forced to `failed`;
//! that is the only edge the sweep ever takes. Terminal hedges are never
//! touched, so repeated passes converge.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::application::hedge::pool::HedgeQueue;
use crate::application::hedge::settings::HedgeSettings;
use crate::application::risk::manager::RiskManager;
use crate::domain::hedge::{HedgeOrder, HedgeStatus};
use crate::error::Result;
use crate::port::inbound::risk::SweepSummary;
use crate::port::outbound::store::Store;

/// Reason recorded on hedges the sweep forces to failed.
pub const REASON_STUCK: &str = "stuck: no terminal state within recovery window";

/// Age thresholds for the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub stuck_after: Duration,
    pub fail_after: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            stuck_after: Duration::minutes(5),
            fail_after: Duration::minutes(30),
        }
    }
}

/// What the sweep does with one hedge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Terminal, or pending but still young.
    Ignore,
    /// Stuck, but attempted recently or out of attempts.
    Stuck,
    /// Stuck and due for another attempt.
    Requeue,
    /// Older than the failure threshold.
    ForceFail,
}

/// Decide the sweep action for a hedge. Pure; no I/O.
#[must_use]
pub fn classify(
    hedge: &HedgeOrder,
    now: DateTime<Utc>,
    policy: &RecoveryPolicy,
    retry_attempts: u32,
) -> SweepAction {
    if hedge.status() != HedgeStatus::Pending {
        return SweepAction::Ignore;
    }
    let age = hedge.age(now);
    if age >= policy.fail_after {
        return SweepAction::ForceFail;
    }
    if age < policy.stuck_after {
        return SweepAction::Ignore;
    }
    let idle = hedge
        .last_attempt_at()
        .map_or(age, |attempted| now - attempted);
    if hedge.attempts() < retry_attempts && idle >= policy.stuck_after {
        SweepAction::Requeue
    } else {
        SweepAction::Stuck
    }
}

/// One scheduled recovery pass over pending hedges.
pub struct RecoverySweep {
    store: Arc<dyn Store>,
    risk: Arc<RiskManager>,
    settings: Arc<HedgeSettings>,
    queue: Option<Arc<dyn HedgeQueue>>,
    policy: RecoveryPolicy,
}

impl RecoverySweep {
    /// Without a queue, stuck hedges are counted but never requeued.
    pub fn new(
        store: Arc<dyn Store>,
        risk: Arc<RiskManager>,
        settings: Arc<HedgeSettings>,
        queue: Option<Arc<dyn HedgeQueue>>,
        policy: RecoveryPolicy,
    ) -> Self {
        Self {
            store,
            risk,
            settings,
            queue,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Run one pass.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn run(&self, now: DateTime<Utc>) -> Result<SweepSummary> {
        let retry_attempts = self.settings.snapshot().retry_attempts;
        let mut summary = SweepSummary {
            stuck: 0,
            requeued: 0,
            forced_failures: 0,
            current_exposure: rust_decimal::Decimal::ZERO,
        };

        for mut hedge in self.store.hedges_by_status(HedgeStatus::Pending)? {
            match classify(&hedge, now, &self.policy, retry_attempts) {
                SweepAction::Ignore => {}
                SweepAction::Stuck => summary.stuck += 1,
                SweepAction::Requeue => {
                    summary.stuck += 1;
                    let Some(queue) = &self.queue else {
                        continue;
                    };
                    // The dispatch counts the attempt; the sweep only restarts the idle window.
                    hedge.touch(now);
                    if self.store.update_hedge(&hedge, HedgeStatus::Pending)?
                        && queue.submit(hedge.id().clone())
                    {
                        summary.requeued += 1;
                        info!(hedge_id = %hedge.id(), attempts = hedge.attempts(), "Stuck hedge requeued");
                    }
                }
                SweepAction::ForceFail => {
                    summary.stuck += 1;
                    hedge.mark_failed(REASON_STUCK, now)?;
                    if self.store.update_hedge(&hedge, HedgeStatus::Pending)? {
                        summary.forced_failures += 1;
                        warn!(
                            hedge_id = %hedge.id(),
                            age_secs = hedge.age(now).num_seconds(),
                            "Stuck hedge forced to failed"
                        );
                    }
                }
            }
        }

        summary.current_exposure = self.risk.aggregate_exposure()?;
        info!(
            stuck = summary.stuck,
            requeued = summary.requeued,
            forced_failures = summary.forced_failures,
            current_exposure = %summary.current_exposure,
            "Recovery sweep complete"
        );
        Ok(summary)
    }
}
