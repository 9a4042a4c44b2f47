//! HTTP API against a live engine.

use std::sync::Arc;

use hedgeline::adapter::inbound::api::router;
use hedgeline::application::engine::Engine;
use hedgeline::testkit::config;
use hedgeline::testkit::harness::Harness;
use hedgeline::testkit::reference::ScriptedReference;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn serve(engine: Arc<Engine>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(engine)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn start() -> (Harness, String) {
    let harness = Harness::start(
        config::engine(vec![config::binary_market("rain", None)]),
        ScriptedReference::new(),
    );
    harness.fund("alice", rust_decimal_macros::dec!(1000));
    let base = serve(Arc::clone(harness.engine())).await;
    (harness, base)
}

fn trade(amount: &str) -> Value {
    json!({
        "user_id": "alice",
        "market_id": "rain",
        "outcome_id": "yes",
        "side": "buy",
        "amount": amount,
        "order_type": "market"
    })
}

#[tokio::test]
async fn trade_round_trip_and_dashboard() {
    let (harness, base) = start().await;
    let client = reqwest::Client::new();

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let response = client
        .post(format!("{base}/trades"))
        .json(&trade("100"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let execution: Value = response.json().await.unwrap();
    assert_eq!(execution["filled"], "100");
    assert_eq!(execution["fills"].as_array().unwrap().len(), 1);
    assert_eq!(execution["fills"][0]["source"], "curve");
    assert_eq!(execution["hedge_ids"].as_array().unwrap().len(), 1);
    assert!(execution["price_after"].as_f64().unwrap() > 0.5);

    harness.wait_for_resolved(1).await;

    let dashboard: Value = client
        .get(format!("{base}/risk/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["total_hedges"], 1);
    assert_eq!(dashboard["placed"], 1);
    assert_eq!(dashboard["markets"][0]["market_id"], "rain");

    let exposure: Value = client
        .get(format!("{base}/risk/exposure"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exposure["positions"][0]["outcome_id"], "yes");
    assert_eq!(exposure["totals"]["net"], "100");

    let snapshot: Value = client
        .post(format!("{base}/risk/snapshot"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["open_positions"], 0);

    let sweep: Value = client
        .post(format!("{base}/recovery/sweep"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sweep["stuck"], 0);
    assert_eq!(sweep["forced_failures"], 0);
    harness.shutdown().await;
}

#[tokio::test]
async fn trade_rejections_carry_code_and_status() {
    let (harness, base) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/trades"))
        .json(&trade("0"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_amount");

    let response = client
        .post(format!("{base}/trades"))
        .json(&json!({
            "user_id": "alice",
            "market_id": "snow",
            "outcome_id": "yes",
            "side": "buy",
            "amount": "10",
            "order_type": "market"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unknown_market");
    assert_eq!(harness.reference.call_count(), 0);
    harness.shutdown().await;
}

#[tokio::test]
async fn hedge_config_is_readable_and_writable() {
    let (harness, base) = start().await;
    let client = reqwest::Client::new();

    let config: Value = client
        .get(format!("{base}/hedge/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(config["enabled"], true);
    assert_eq!(config["max_slippage_bps"], 100);

    let response = client
        .put(format!("{base}/hedge/config"))
        .json(&json!({ "key": "maxSlippageBps", "value": 250 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["max_slippage_bps"], 250);
    assert_eq!(harness.engine().hedge_config().max_slippage_bps, 250);

    let response = client
        .put(format!("{base}/hedge/config"))
        .json(&json!({ "key": "enabled", "value": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!harness.engine().hedge_config().enabled);

    let response = client
        .put(format!("{base}/hedge/config"))
        .json(&json!({ "key": "leverage", "value": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unknown_key");

    let response = client
        .put(format!("{base}/hedge/config"))
        .json(&json!({ "key": "min_spread_bps", "value": 9000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_value");
    assert_eq!(harness.engine().hedge_config().min_spread_bps, 50);
    harness.shutdown().await;
}
