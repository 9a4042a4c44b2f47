//! Handlers for the one-shot `sweep`, `snapshot`, and `dashboard` commands.
//!
//! These run against the configured store without a worker pool, so the
//! sweep never requeues; it reports stuck hedges and force-fails old ones.

use std::path::Path;

use serde::Serialize;
use tabled::Tabled;

use crate::adapter::inbound::cli::{operator, output};
use crate::error::Result;
use crate::port::inbound::risk::RiskDashboard;

/// Execute `sweep`.
pub fn execute_sweep(path: &Path) -> Result<()> {
    let config_toml = operator::read_config_toml(path)?;
    let summary = operator::operator()?.sweep(&config_toml)?;
    if output::is_json() {
        output::json_output(&summary);
        return Ok(());
    }
    output::success("Recovery sweep complete");
    output::field("Stuck", summary.stuck);
    output::field("Force-failed", summary.forced_failures);
    output::field("Exposure", summary.current_exposure);
    Ok(())
}

/// Execute `snapshot`.
pub fn execute_snapshot(path: &Path) -> Result<()> {
    let config_toml = operator::read_config_toml(path)?;
    let snapshot = operator::operator()?.snapshot(&config_toml)?;
    if output::is_json() {
        output::json_output(&snapshot);
        return Ok(());
    }
    output::success("Risk snapshot saved");
    output::field("Unhedged", snapshot.total_unhedged);
    output::field("Hedged", snapshot.total_hedged);
    output::field("Open positions", snapshot.open_positions);
    output::field("Recent failures", snapshot.recent_failures);
    output::field("Failure rate", output::percent(snapshot.failure_rate));
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct MarketRow {
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Unhedged")]
    unhedged: String,
    #[tabled(rename = "Pending")]
    pending: u64,
    #[tabled(rename = "Placed")]
    placed: u64,
    #[tabled(rename = "Failed")]
    failed: u64,
}

#[derive(Debug, Serialize, Tabled)]
struct FailureRow {
    #[tabled(rename = "Hedge")]
    hedge: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "At")]
    at: String,
}

/// Execute `dashboard`.
pub fn execute_dashboard(path: &Path) -> Result<()> {
    let config_toml = operator::read_config_toml(path)?;
    let dashboard = operator::operator()?.dashboard(&config_toml)?;
    if output::is_json() {
        output::json_output(&dashboard);
        return Ok(());
    }
    render(&dashboard);
    Ok(())
}

fn render(dashboard: &RiskDashboard) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Hedges");
    output::field("Total", dashboard.total_hedges);
    output::field("Placed", dashboard.placed);
    output::field("Failed", dashboard.failed);
    output::field("Pending", dashboard.pending);
    output::field("Success rate", output::percent(dashboard.success_rate));

    output::section("Exposure");
    output::field("Net", output::signed(dashboard.net_exposure));
    output::field("Unhedged", dashboard.unhedged_exposure);
    output::field("Hedged", dashboard.hedged_amount);
    output::field("Pending", dashboard.pending_exposure);

    if !dashboard.markets.is_empty() {
        output::section("Markets");
        let rows: Vec<MarketRow> = dashboard
            .markets
            .iter()
            .map(|market| MarketRow {
                market: market.market_id.to_string(),
                net: market.net_exposure.to_string(),
                unhedged: market.unhedged.to_string(),
                pending: market.pending,
                placed: market.placed,
                failed: market.failed,
            })
            .collect();
        output::table("market", &rows);
    }

    if !dashboard.recent_failures.is_empty() {
        output::section("Recent Failures");
        let rows: Vec<FailureRow> = dashboard
            .recent_failures
            .iter()
            .map(|failure| FailureRow {
                hedge: failure.hedge_id.to_string(),
                market: failure.market_id.to_string(),
                amount: failure.amount.to_string(),
                reason: failure.reason.clone(),
                at: failure.failed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect();
        output::table("failure", &rows);
    }

    if let Some(last) = dashboard.snapshots.last() {
        output::section("Latest Snapshot");
        output::field("Taken", last.created_at.format("%Y-%m-%d %H:%M:%S"));
        output::field("Unhedged", last.total_unhedged);
        output::field("Failure rate", output::percent(last.failure_rate));
    }
}
