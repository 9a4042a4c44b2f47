//! Engine facade used by the inbound adapters.
//!
//! A trade is matched and committed first. Hedges for its curve fills are
//! then recorded and handed to the worker pool after the market lock has
//! been released. Nothing on the hedge side can fail a committed trade.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::application::exposure::{ExposureLedger, ExposureTotals};
use crate::application::hedge::dispatcher::HedgeDispatcher;
use crate::application::hedge::pool::HedgeQueue;
use crate::application::hedge::settings::HedgeSettings;
use crate::application::matching::HybridMatcher;
use crate::application::recovery::RecoverySweep;
use crate::application::risk::manager::RiskManager;
use crate::domain::exposure::ExposurePosition;
use crate::domain::hedge::HedgeStatus;
use crate::domain::snapshot::RiskSnapshot;
use crate::error::{ConfigError, Result, TradeError};
use crate::port::inbound::config::HedgeConfig;
use crate::port::inbound::risk::{RiskDashboard, SweepSummary};
use crate::port::inbound::trade::{TradeExecution, TradeRequest};

/// The assembled engine.
pub struct Engine {
    matcher: Arc<HybridMatcher>,
    dispatcher: Arc<HedgeDispatcher>,
    queue: Arc<dyn HedgeQueue>,
    settings: Arc<HedgeSettings>,
    risk: Arc<RiskManager>,
    exposure: Arc<ExposureLedger>,
    sweep: Arc<RecoverySweep>,
}

impl Engine {
    pub fn new(
        matcher: Arc<HybridMatcher>,
        dispatcher: Arc<HedgeDispatcher>,
        queue: Arc<dyn HedgeQueue>,
        settings: Arc<HedgeSettings>,
        risk: Arc<RiskManager>,
        exposure: Arc<ExposureLedger>,
        sweep: Arc<RecoverySweep>,
    ) -> Self {
        Self {
            matcher,
            dispatcher,
            queue,
            settings,
            risk,
            exposure,
            sweep,
        }
    }

    #[must_use]
    pub fn matcher(&self) -> &Arc<HybridMatcher> {
        &self.matcher
    }

    #[must_use]
    pub fn risk(&self) -> &Arc<RiskManager> {
        &self.risk
    }

    #[must_use]
    pub fn sweeper(&self) -> &Arc<RecoverySweep> {
        &self.sweep
    }

    /// Match and commit a trade, then schedule hedges for its curve fills.
    ///
    /// # Errors
    ///
    /// Only trade-path rejections; hedge problems are logged and recorded.
    pub async fn submit_trade(&self, request: &TradeRequest) -> std::result::Result<TradeExecution, TradeError> {
        let mut execution = self.matcher.execute(request).await?;

        for fill in execution.fills.iter().filter(|fill| fill.is_curve()) {
            match self.dispatcher.prepare(fill) {
                Ok(hedge) => {
                    execution.hedge_ids.push(hedge.id().clone());
                    if hedge.status() == HedgeStatus::Pending {
                        self.queue.submit(hedge.id().clone());
                    }
                }
                Err(e) => {
                    error!(fill_id = %fill.id, market_id = %fill.market_id, error = %e, "Hedge not recorded");
                }
            }
        }
        Ok(execution)
    }

    #[must_use]
    pub fn hedge_config(&self) -> Arc<HedgeConfig> {
        self.settings.snapshot()
    }

    /// Change one allow-listed hedge setting.
    ///
    /// # Errors
    ///
    /// Unknown keys and invalid values; the active configuration is unchanged.
    pub fn set_hedge_config(&self, key: &str, value: &str) -> std::result::Result<Arc<HedgeConfig>, ConfigError> {
        self.settings.set(key, value)
    }

    /// Swap in a complete hedge configuration.
    ///
    /// # Errors
    ///
    /// Invalid configurations are rejected.
    pub fn reload_hedge_config(&self, config: HedgeConfig) -> std::result::Result<(), ConfigError> {
        self.settings.reload(config)
    }

    /// # Errors
    ///
    /// Propagates store failures.
    pub fn dashboard(&self) -> Result<RiskDashboard> {
        self.risk.dashboard(Utc::now())
    }

    /// # Errors
    ///
    /// Propagates store failures.
    pub fn snapshot(&self) -> Result<RiskSnapshot> {
        self.risk.take_snapshot(Utc::now())
    }

    /// Run one recovery pass now.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn sweep(&self) -> Result<SweepSummary> {
        let summary = self.sweep.run(Utc::now())?;
        info!(stuck = summary.stuck, forced_failures = summary.forced_failures, "Manual recovery sweep");
        Ok(summary)
    }

    #[must_use]
    pub fn exposure(&self) -> (Vec<ExposurePosition>, ExposureTotals) {
        (self.exposure.positions(), self.exposure.totals())
    }
}
