//! Hybrid matching through the assembled engine: curve pricing, price-time
//! priority against resting orders, escrow, and pre-commit rejections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hedgeline::adapter::outbound::ledger::MemoryLedger;
use hedgeline::adapter::outbound::memory::MemoryStore;
use hedgeline::application::exposure::ExposureLedger;
use hedgeline::application::matching::{HybridMatcher, MatcherConfig};
use hedgeline::domain::book::OrderBook;
use hedgeline::domain::fill::{Fill, FillSource};
use hedgeline::domain::hedge::{HedgeOrder, HedgeStatus};
use hedgeline::domain::id::{HedgeId, MarketId, OrderId, OutcomeId, UserId};
use hedgeline::domain::order::{Order, OrderType, Side};
use hedgeline::domain::snapshot::RiskSnapshot;
use hedgeline::error::TradeError;
use hedgeline::infrastructure::config::market::{MarketConfig, MarketKind, OutcomeConfig};
use hedgeline::port::inbound::trade::TradeRequest;
use hedgeline::port::outbound::ledger::share_token;
use hedgeline::port::outbound::store::{HedgeStore, SnapshotStore, TradeStore};
use hedgeline::testkit::config;
use hedgeline::testkit::domain::{binary_market, limit_order, market_order};
use hedgeline::testkit::harness::Harness;
use hedgeline::testkit::reference::ScriptedReference;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn yes_price(market: &hedgeline::domain::market::Market) -> f64 {
    market.price(&OutcomeId::new("yes")).unwrap()
}

fn fund_shares(harness: &Harness, user: &str, market: &str, outcome: &str, shares: Decimal) {
    let token = share_token(&MarketId::new(market), &OutcomeId::new(outcome));
    harness.ledger.fund(&UserId::new(user), &token, shares);
}

/// $100 of YES on a b=10000 binary market moves the price up a little; the
/// same amount of NO pulls it back toward even.
#[tokio::test]
async fn opposite_curve_buys_move_price_back_toward_even() {
    let harness = Harness::start(
        config::engine(vec![config::binary_market("rain", None)]),
        ScriptedReference::new(),
    );
    harness.fund("alice", dec!(1000));

    let first = harness
        .engine()
        .submit_trade(&market_order("alice", "rain", "yes", Side::Buy, dec!(100)))
        .await
        .unwrap();

    assert!((first.price_before - 0.5).abs() < 1e-12);
    assert!(first.price_after > 0.5 && first.price_after < 1.0);
    assert_eq!(first.filled, dec!(100));
    assert_eq!(first.fills.len(), 1);
    assert_eq!(first.fills[0].source, FillSource::Curve);
    assert!(first.shares() > dec!(199) && first.shares() < dec!(200));

    harness
        .engine()
        .submit_trade(&market_order("alice", "rain", "no", Side::Buy, dec!(100)))
        .await
        .unwrap();

    let market = harness
        .engine()
        .matcher()
        .market(&MarketId::new("rain"))
        .await
        .unwrap();
    let after = yes_price(&market);
    assert!(after < first.price_after);
    assert!((after - 0.5).abs() < first.price_after - 0.5);
    assert!((market.prices().iter().sum::<f64>() - 1.0).abs() < 1e-9);

    assert_eq!(harness.balance("alice", "USDC"), dec!(800));
    assert!(harness.balance("alice", "rain:yes") > dec!(199));
    assert!(harness.balance("alice", "rain:no") > dec!(199));

    harness.wait_for_resolved(2).await;
    harness.shutdown().await;
}

#[tokio::test]
async fn resting_orders_fill_by_price_then_time() {
    let harness = Harness::start(
        config::engine(vec![config::binary_market("book", Some(100.0))]),
        ScriptedReference::new(),
    );
    for seller in ["carol", "dave", "erin"] {
        fund_shares(&harness, seller, "book", "yes", dec!(100));
    }
    harness.fund("taker", dec!(1000));

    let mut resting = Vec::new();
    for (seller, price, amount) in [
        ("carol", dec!(0.60), dec!(30)),
        ("dave", dec!(0.55), dec!(20)),
        ("erin", dec!(0.55), dec!(20)),
    ] {
        let execution = harness
            .engine()
            .submit_trade(&limit_order(seller, "book", "yes", Side::Sell, amount, price))
            .await
            .unwrap();
        assert!(execution.rested);
        assert!(execution.fills.is_empty());
        resting.push(execution.order.id().clone());
    }
    let book_id = MarketId::new("book");
    assert_eq!(harness.engine().matcher().resting_orders(&book_id).await, Some(3));

    let execution = harness
        .engine()
        .submit_trade(&market_order("taker", "book", "yes", Side::Buy, dec!(100)))
        .await
        .unwrap();

    assert_eq!(execution.filled, dec!(100));
    assert_eq!(execution.fills[0].source, FillSource::Curve);
    let makers: Vec<_> = execution
        .fills
        .iter()
        .filter(|fill| fill.source == FillSource::Book)
        .map(|fill| fill.maker_order_id.clone().unwrap())
        .collect();
    // dave and erin share a price; dave rested first.
    assert_eq!(makers, vec![resting[1].clone(), resting[2].clone(), resting[0].clone()]);
    assert!(execution.fills.iter().all(|fill| fill.user_id == UserId::new("taker")));
    assert!(execution.price_after > 0.6);

    assert_eq!(harness.balance("carol", "USDC"), dec!(30));
    assert_eq!(harness.balance("dave", "USDC"), dec!(20));
    assert_eq!(harness.balance("erin", "USDC"), dec!(20));
    assert_eq!(harness.balance("taker", "USDC"), dec!(900));
    assert_eq!(harness.engine().matcher().resting_orders(&book_id).await, Some(0));

    // Book fills carry no hedge.
    let curve_fills = execution.fills.iter().filter(|fill| fill.is_curve()).count();
    assert_eq!(execution.hedge_ids.len(), curve_fills);
    harness.shutdown().await;
}

#[tokio::test]
async fn limit_remainder_rests_with_escrow_and_is_taken_later() {
    let harness = Harness::start(
        config::engine(vec![config::binary_market("book", Some(100.0))]),
        ScriptedReference::new(),
    );
    harness.fund("alice", dec!(1000));
    fund_shares(&harness, "bob", "book", "yes", dec!(100));

    let bid = harness
        .engine()
        .submit_trade(&limit_order("alice", "book", "yes", Side::Buy, dec!(100), dec!(0.55)))
        .await
        .unwrap();

    assert!(bid.filled > Decimal::ZERO && bid.filled < dec!(100));
    assert!(bid.rested);
    assert_eq!(bid.remainder, dec!(100) - bid.filled);
    assert!(bid.fills.iter().all(|fill| fill.price <= dec!(0.55)));
    // Filled notional is spent and the remainder is escrowed.
    assert_eq!(harness.balance("alice", "USDC"), dec!(900));

    let sale = harness
        .engine()
        .submit_trade(&market_order("bob", "book", "yes", Side::Sell, dec!(20)))
        .await
        .unwrap();

    assert_eq!(sale.filled, dec!(20));
    assert!(sale
        .fills
        .iter()
        .any(|fill| fill.maker_order_id.as_ref() == Some(bid.order.id())));
    assert_eq!(harness.balance("bob", "USDC"), dec!(20));
    assert_eq!(
        harness.engine().matcher().resting_orders(&MarketId::new("book")).await,
        Some(1)
    );
    harness.shutdown().await;
}

#[tokio::test]
async fn rejected_trades_change_nothing() {
    let harness = Harness::start(
        config::engine(vec![config::binary_market("rain", None)]),
        ScriptedReference::new(),
    );
    harness.fund("alice", dec!(50));
    let engine = harness.engine();

    let zero = engine
        .submit_trade(&market_order("alice", "rain", "yes", Side::Buy, Decimal::ZERO))
        .await;
    assert!(matches!(zero, Err(TradeError::InvalidAmount { .. })));

    let unknown = engine
        .submit_trade(&market_order("alice", "snow", "yes", Side::Buy, dec!(10)))
        .await;
    assert!(matches!(unknown, Err(TradeError::UnknownMarket { .. })));

    let outcome = engine
        .submit_trade(&market_order("alice", "rain", "maybe", Side::Buy, dec!(10)))
        .await;
    assert!(matches!(outcome, Err(TradeError::UnknownOutcome { .. })));

    let no_price = TradeRequest {
        order_type: OrderType::Limit,
        ..market_order("alice", "rain", "yes", Side::Buy, dec!(10))
    };
    assert!(matches!(
        engine.submit_trade(&no_price).await,
        Err(TradeError::MissingLimitPrice)
    ));

    let bad_price = limit_order("alice", "rain", "yes", Side::Buy, dec!(10), dec!(1));
    assert!(matches!(
        engine.submit_trade(&bad_price).await,
        Err(TradeError::InvalidPrice { .. })
    ));

    let too_large = engine
        .submit_trade(&market_order("alice", "rain", "yes", Side::Buy, dec!(10001)))
        .await;
    assert!(matches!(too_large, Err(TradeError::OrderTooLarge { .. })));

    let broke = engine
        .submit_trade(&market_order("alice", "rain", "yes", Side::Buy, dec!(100)))
        .await;
    assert!(matches!(broke, Err(TradeError::InsufficientBalance { .. })));

    let out_of_reach = TradeRequest {
        limit_price: Some(dec!(0.3)),
        ..market_order("alice", "rain", "yes", Side::Buy, dec!(10))
    };
    assert!(matches!(
        engine.submit_trade(&out_of_reach).await,
        Err(TradeError::InsufficientLiquidity { .. })
    ));

    let market = engine.matcher().market(&MarketId::new("rain")).await.unwrap();
    assert!((yes_price(&market) - 0.5).abs() < 1e-12);
    assert_eq!(harness.balance("alice", "USDC"), dec!(50));
    assert!(harness.store.list_hedges().unwrap().is_empty());
    assert!(harness.store.fills_for_market(&MarketId::new("rain")).unwrap().is_empty());
    harness.shutdown().await;
}

#[tokio::test]
async fn multi_outcome_prices_stay_normalized() {
    let market = MarketConfig {
        id: "winner".to_string(),
        question: "Who wins?".to_string(),
        kind: MarketKind::Multi,
        liquidity: Some(1000.0),
        probabilities: Some(vec![0.5, 0.3, 0.2]),
        outcomes: ["a", "b", "c"]
            .into_iter()
            .map(|outcome| OutcomeConfig {
                id: outcome.to_string(),
                external_instrument_id: format!("ext-winner-{outcome}"),
                display_name: None,
            })
            .collect(),
    };
    let harness = Harness::start(config::engine(vec![market]), ScriptedReference::new());
    harness.fund("alice", dec!(500));
    let winner = MarketId::new("winner");

    let before = harness.engine().matcher().market(&winner).await.unwrap().prices();
    assert!((before[0] - 0.5).abs() < 1e-9);
    assert!((before[2] - 0.2).abs() < 1e-9);

    let execution = harness
        .engine()
        .submit_trade(&market_order("alice", "winner", "c", Side::Buy, dec!(200)))
        .await
        .unwrap();
    assert!((execution.price_before - 0.2).abs() < 1e-9);

    let after = harness.engine().matcher().market(&winner).await.unwrap().prices();
    assert!(after[2] > before[2]);
    assert!(after[0] < before[0] && after[1] < before[1]);
    assert!((after.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    let hedges = harness.wait_for_resolved(1).await;
    assert_eq!(hedges.len(), 1);
    assert_eq!(harness.reference.calls()[0].instrument_id.as_str(), "ext-winner-c");
    harness.shutdown().await;
}

/// Memory store whose first trade write stalls, to widen the window between
/// a commit and its persistence.
struct StallingStore {
    inner: MemoryStore,
    stall: AtomicBool,
    stalled: AtomicBool,
}

impl StallingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            stall: AtomicBool::new(true),
            stalled: AtomicBool::new(false),
        }
    }
}

impl TradeStore for StallingStore {
    fn record_trade(&self, orders: &[Order], fills: &[Fill]) -> hedgeline::error::Result<()> {
        if self.stall.swap(false, Ordering::SeqCst) {
            self.stalled.store(true, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(300));
        }
        self.inner.record_trade(orders, fills)
    }

    fn get_order(&self, id: &OrderId) -> hedgeline::error::Result<Option<Order>> {
        self.inner.get_order(id)
    }

    fn open_orders(&self) -> hedgeline::error::Result<Vec<Order>> {
        self.inner.open_orders()
    }

    fn fills_for_market(&self, market_id: &MarketId) -> hedgeline::error::Result<Vec<Fill>> {
        self.inner.fills_for_market(market_id)
    }

    fn max_sequence(&self) -> hedgeline::error::Result<u64> {
        self.inner.max_sequence()
    }
}

impl HedgeStore for StallingStore {
    fn insert_hedge(&self, hedge: &HedgeOrder) -> hedgeline::error::Result<()> {
        self.inner.insert_hedge(hedge)
    }

    fn get_hedge(&self, id: &HedgeId) -> hedgeline::error::Result<Option<HedgeOrder>> {
        self.inner.get_hedge(id)
    }

    fn update_hedge(&self, hedge: &HedgeOrder, expected: HedgeStatus) -> hedgeline::error::Result<bool> {
        self.inner.update_hedge(hedge, expected)
    }

    fn hedges_by_status(&self, status: HedgeStatus) -> hedgeline::error::Result<Vec<HedgeOrder>> {
        self.inner.hedges_by_status(status)
    }

    fn list_hedges(&self) -> hedgeline::error::Result<Vec<HedgeOrder>> {
        self.inner.list_hedges()
    }

    fn failures_since(&self, since: DateTime<Utc>, limit: usize) -> hedgeline::error::Result<Vec<HedgeOrder>> {
        self.inner.failures_since(since, limit)
    }
}

impl SnapshotStore for StallingStore {
    fn save_snapshot(&self, snapshot: &RiskSnapshot) -> hedgeline::error::Result<()> {
        self.inner.save_snapshot(snapshot)
    }

    fn recent_snapshots(&self, limit: usize) -> hedgeline::error::Result<Vec<RiskSnapshot>> {
        self.inner.recent_snapshots(limit)
    }
}

/// A slow write for one trade must not let a later trade on the same market
/// persist first: the stored maker order has to end up as the book left it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn persisted_orders_follow_commit_order_under_contention() {
    let store = Arc::new(StallingStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    ledger.fund(&UserId::new("carol"), "book:yes", dec!(100));
    ledger.fund(&UserId::new("taker"), "USDC", dec!(1000));
    let matcher = Arc::new(HybridMatcher::new(
        MatcherConfig::default(),
        ledger,
        store.clone(),
        Arc::new(ExposureLedger::new()),
    ));
    let book_id = MarketId::new("book");
    matcher.register(binary_market("book", 100.0), OrderBook::new(book_id.clone()));

    let maker = {
        let matcher = Arc::clone(&matcher);
        tokio::spawn(async move {
            matcher
                .execute(&limit_order("carol", "book", "yes", Side::Sell, dec!(11), dec!(0.55)))
                .await
        })
    };
    for _ in 0..200 {
        if store.stalled.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    assert!(store.stalled.load(Ordering::SeqCst));

    let taker = matcher
        .execute(&market_order("taker", "book", "yes", Side::Buy, dec!(100)))
        .await
        .unwrap();
    let maker = maker.await.unwrap().unwrap();

    assert!(maker.rested);
    assert!(taker
        .fills
        .iter()
        .any(|fill| fill.maker_order_id.as_ref() == Some(maker.order.id())));
    assert_eq!(matcher.resting_orders(&book_id).await, Some(0));

    let stored = store.get_order(maker.order.id()).unwrap().unwrap();
    assert!(!stored.is_open());
    assert!(stored.remaining() <= dec!(0.000001));
    assert!(store.open_orders().unwrap().is_empty());
    assert_eq!(store.fills_for_market(&book_id).unwrap().len(), taker.fills.len());
}
