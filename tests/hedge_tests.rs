//! Hedge replication: placement, disabled hedging, venue failures,
//! timeouts, risk refusals, and runtime configuration changes.

use std::time::Duration;

use hedgeline::application::hedge::dispatcher::hedge_price;
use hedgeline::domain::hedge::{HedgeStatus, REASON_DISABLED};
use hedgeline::domain::order::Side;
use hedgeline::error::ConfigError;
use hedgeline::port::outbound::store::HedgeStore;
use hedgeline::testkit::config;
use hedgeline::testkit::domain::market_order;
use hedgeline::testkit::harness::Harness;
use hedgeline::testkit::reference::{ScriptedReference, Step};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn rain() -> hedgeline::infrastructure::config::settings::Config {
    config::engine(vec![config::binary_market("rain", None)])
}

async fn buy_yes(harness: &Harness, amount: Decimal) -> hedgeline::port::inbound::trade::TradeExecution {
    harness
        .engine()
        .submit_trade(&market_order("alice", "rain", "yes", Side::Buy, amount))
        .await
        .unwrap()
}

#[tokio::test]
async fn curve_fill_is_replicated_on_the_reference_market() {
    let harness = Harness::start(rain(), ScriptedReference::new());
    harness.fund("alice", dec!(1000));

    let execution = buy_yes(&harness, dec!(100)).await;
    assert_eq!(execution.hedge_ids.len(), 1);

    let hedges = harness.wait_for_resolved(1).await;
    let hedge = &hedges[0];
    let fill = &execution.fills[0];
    assert_eq!(hedge.status(), HedgeStatus::Placed);
    assert_eq!(hedge.id(), &execution.hedge_ids[0]);
    assert_eq!(hedge.request().fill_id, fill.id);
    assert_eq!(hedge.request().amount, dec!(100));
    assert_eq!(hedge.request().size, fill.shares);
    assert_eq!(hedge.attempts(), 1);
    assert!(hedge.external_order_id().unwrap().starts_with("scripted-"));

    let calls = harness.reference.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].instrument_id.as_str(), "ext-rain-yes");
    assert_eq!(calls[0].side, Side::Buy);
    assert_eq!(calls[0].size, fill.shares);
    assert_eq!(calls[0].price, hedge_price(fill.price, Side::Buy, 100));
    assert!(calls[0].price > fill.price);

    let (positions, totals) = harness.engine().exposure();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].net_exposure, dec!(100));
    assert_eq!(totals.hedged, dec!(100));
    assert_eq!(totals.unhedged, Decimal::ZERO);

    let dashboard = harness.engine().dashboard().unwrap();
    assert_eq!(dashboard.placed, 1);
    assert_eq!(dashboard.pending, 0);
    assert!((dashboard.success_rate - 1.0).abs() < f64::EPSILON);
    harness.shutdown().await;
}

#[tokio::test]
async fn disabled_hedging_still_fills_the_trade() {
    let mut config = rain();
    config.hedge.enabled = false;
    let harness = Harness::start(config, ScriptedReference::new());
    harness.fund("alice", dec!(1000));

    let execution = buy_yes(&harness, dec!(100)).await;

    assert_eq!(execution.filled, dec!(100));
    assert_eq!(execution.remainder, Decimal::ZERO);
    let hedge = harness
        .store
        .get_hedge(&execution.hedge_ids[0])
        .unwrap()
        .unwrap();
    assert_eq!(hedge.status(), HedgeStatus::Failed);
    assert_eq!(hedge.reason(), Some(REASON_DISABLED));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.reference.call_count(), 0);

    let (_, totals) = harness.engine().exposure();
    assert_eq!(totals.net, dec!(100));
    assert_eq!(totals.unhedged, dec!(100));
    harness.shutdown().await;
}

#[tokio::test]
async fn venue_rejection_fails_the_hedge_but_not_the_trade() {
    let harness = Harness::start(
        rain(),
        ScriptedReference::with_script([Step::Reject("venue down".into())]),
    );
    harness.fund("alice", dec!(1000));

    let execution = buy_yes(&harness, dec!(100)).await;
    assert_eq!(execution.filled, dec!(100));

    let hedges = harness.wait_for_resolved(1).await;
    assert_eq!(hedges[0].status(), HedgeStatus::Failed);
    assert!(hedges[0].reason().unwrap().contains("venue down"));
    assert_eq!(harness.balance("alice", "USDC"), dec!(900));

    // The outcome listener counts the failure asynchronously.
    let mut external = 0;
    for _ in 0..200 {
        external = harness.engine().dashboard().unwrap().external_failures_total;
        if external > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(external, 1);

    let dashboard = harness.engine().dashboard().unwrap();
    assert_eq!(dashboard.failed, 1);
    assert_eq!(dashboard.recent_failures.len(), 1);
    assert_eq!(dashboard.recent_failures[0].hedge_id, execution.hedge_ids[0]);
    harness.shutdown().await;
}

#[tokio::test]
async fn unanswered_hedge_times_out() {
    let mut config = rain();
    config.hedge.hedge_timeout_ms = 50;
    let harness = Harness::start(config, ScriptedReference::with_script([Step::Hang]));
    harness.fund("alice", dec!(1000));

    buy_yes(&harness, dec!(100)).await;

    let hedges = harness.wait_for_resolved(1).await;
    assert_eq!(hedges[0].status(), HedgeStatus::Failed);
    assert!(hedges[0].reason().unwrap().contains("timed out after 50ms"));
    assert_eq!(hedges[0].attempts(), 1);
    harness.shutdown().await;
}

#[tokio::test]
async fn oversized_hedge_is_refused_before_reaching_the_venue() {
    let mut config = rain();
    config.hedge.max_position_size = dec!(50);
    let harness = Harness::start(config, ScriptedReference::new());
    harness.fund("alice", dec!(1000));

    let execution = buy_yes(&harness, dec!(100)).await;
    assert_eq!(execution.filled, dec!(100));

    let hedges = harness.wait_for_resolved(1).await;
    assert_eq!(hedges[0].status(), HedgeStatus::Failed);
    assert!(hedges[0].reason().unwrap().contains("position size"));
    assert_eq!(harness.reference.call_count(), 0);
    harness.shutdown().await;
}

#[tokio::test]
async fn partial_external_fill_leaves_exposure_unhedged() {
    let harness = Harness::start(rain(), ScriptedReference::with_script([Step::Partial(dec!(0))]));
    harness.fund("alice", dec!(1000));

    buy_yes(&harness, dec!(100)).await;

    let hedges = harness.wait_for_resolved(1).await;
    assert_eq!(hedges[0].status(), HedgeStatus::Placed);
    assert_eq!(hedges[0].filled_size(), Decimal::ZERO);
    let (_, totals) = harness.engine().exposure();
    assert_eq!(totals.hedged, Decimal::ZERO);
    assert_eq!(totals.unhedged, dec!(100));
    harness.shutdown().await;
}

#[tokio::test]
async fn config_changes_apply_to_later_hedges() {
    let harness = Harness::start(rain(), ScriptedReference::new());
    harness.fund("alice", dec!(1000));
    let engine = harness.engine();

    let updated = engine.set_hedge_config("maxSlippageBps", "250").unwrap();
    assert_eq!(updated.max_slippage_bps, 250);
    assert_eq!(engine.hedge_config().max_slippage_bps, 250);

    let execution = buy_yes(&harness, dec!(100)).await;
    harness.wait_for_resolved(1).await;
    assert_eq!(
        harness.reference.calls()[0].price,
        hedge_price(execution.fills[0].price, Side::Buy, 250)
    );

    engine.set_hedge_config("enabled", "false").unwrap();
    let disabled = buy_yes(&harness, dec!(10)).await;
    let hedge = harness
        .store
        .get_hedge(&disabled.hedge_ids[0])
        .unwrap()
        .unwrap();
    assert_eq!(hedge.reason(), Some(REASON_DISABLED));

    let unknown = engine.set_hedge_config("leverage", "3");
    assert!(matches!(unknown, Err(ConfigError::UnknownKey { .. })));
    let invalid = engine.set_hedge_config("hedgeTimeoutMs", "0");
    assert!(matches!(invalid, Err(ConfigError::InvalidValue { .. })));
    assert_eq!(engine.hedge_config().hedge_timeout_ms, 5_000);
    harness.shutdown().await;
}

#[tokio::test]
async fn every_hedge_reaches_a_terminal_state_under_load() {
    let harness = Harness::start(
        rain(),
        ScriptedReference::with_script([
            Step::Delay(Duration::from_millis(20)),
            Step::Reject("busy".into()),
            Step::Fill,
            Step::Delay(Duration::from_millis(5)),
        ]),
    );
    harness.fund("alice", dec!(10000));

    let mut submitted = 0;
    for i in 0..10 {
        let outcome = if i % 2 == 0 { "yes" } else { "no" };
        let execution = harness
            .engine()
            .submit_trade(&market_order("alice", "rain", outcome, Side::Buy, dec!(25)))
            .await
            .unwrap();
        submitted += execution.hedge_ids.len();
    }

    let hedges = harness.wait_for_resolved(submitted).await;
    assert_eq!(hedges.len(), 10);
    assert!(hedges.iter().all(|hedge| hedge.status().is_terminal()));
    assert_eq!(
        hedges
            .iter()
            .filter(|hedge| hedge.status() == HedgeStatus::Failed)
            .count(),
        1
    );
    assert_eq!(harness.reference.call_count(), 10);
    harness.shutdown().await;
}
