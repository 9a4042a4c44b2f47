//! End-to-end tests of the `hedgeline` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use chrono::{Duration, Utc};
use hedgeline::domain::hedge::{HedgeOrder, HedgeRequest, HedgeStatus};
use hedgeline::domain::id::{FillId, HedgeId, InstrumentId, MarketId, OrderId, OutcomeId};
use hedgeline::domain::order::Side;
use hedgeline::infrastructure::bootstrap::open_store;
use hedgeline::infrastructure::config::settings::Config;
use hedgeline::port::outbound::store::HedgeStore;
use predicates::prelude::*;
use rust_decimal_macros::dec;
use serde_json::Value;

const EXAMPLE: &str = include_str!("../config.toml.example");

fn hedgeline() -> Command {
    let mut cmd = Command::cargo_bin("hedgeline").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

fn database_config(dir: &Path) -> String {
    let database = dir.join("engine.db");
    format!(
        r#"database = "{}"

[[markets]]
id = "rain"
question = "Rain?"

[[markets.outcomes]]
id = "yes"
external_instrument_id = "ext-rain-yes"

[[markets.outcomes]]
id = "no"
external_instrument_id = "ext-rain-no"
"#,
        database.to_string_lossy().replace('\\', "/")
    )
}

fn stale_hedge() -> HedgeOrder {
    HedgeOrder::pending(
        HedgeId::generate(),
        HedgeRequest {
            fill_id: FillId::generate(),
            order_id: OrderId::generate(),
            market_id: MarketId::new("rain"),
            outcome_id: OutcomeId::new("yes"),
            instrument_id: InstrumentId::new("ext-rain-yes"),
            side: Side::Buy,
            price: dec!(0.505),
            amount: dec!(10),
            size: dec!(20),
        },
        Utc::now() - Duration::minutes(45),
    )
}

#[test]
fn validate_accepts_the_shipped_example() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), EXAMPLE);

    hedgeline()
        .args(["config", "validate", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file is valid"));
}

#[test]
fn validate_reports_the_offending_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[hedge]\nmax_slippage_bps = 20000\n");

    hedgeline()
        .args(["config", "validate", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_slippage_bps"));
}

#[test]
fn init_writes_a_valid_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    hedgeline()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(Config::load(&path).is_ok());

    hedgeline()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    hedgeline()
        .args(["config", "init", "--force"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn set_updates_one_hedge_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), EXAMPLE);

    hedgeline()
        .args(["config", "set", "maxSlippageBps", "250", "-c"])
        .arg(&path)
        .assert()
        .success();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.hedge.max_slippage_bps, 250);
    assert_eq!(config.markets.len(), 2);

    hedgeline()
        .args(["config", "set", "leverage", "3", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("leverage"));

    hedgeline()
        .args(["config", "set", "hedge_timeout_ms", "0", "-c"])
        .arg(&path)
        .assert()
        .failure();
    assert_eq!(Config::load(&path).unwrap().hedge.hedge_timeout_ms, 5000);
}

#[test]
fn show_prints_the_effective_config_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "");

    let output = hedgeline()
        .args(["--json", "config", "show", "-c"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["hedge"]["enabled"], true);
    assert_eq!(shown["engine"]["collateral_token"], "USDC");
}

#[test]
fn sweep_forces_stale_hedges_to_failed() {
    let dir = tempfile::tempdir().unwrap();
    let contents = database_config(dir.path());
    let path = write_config(dir.path(), &contents);
    let config = Config::parse_toml(&contents).unwrap();

    let hedge = stale_hedge();
    {
        let store = open_store(&config).unwrap();
        store.insert_hedge(&hedge).unwrap();
    }

    let output = hedgeline()
        .args(["--json", "sweep", "-c"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["stuck"], 1);
    assert_eq!(summary["forced_failures"], 1);
    assert_eq!(summary["requeued"], 0);

    let store = open_store(&config).unwrap();
    let stored = store.get_hedge(hedge.id()).unwrap().unwrap();
    assert_eq!(stored.status(), HedgeStatus::Failed);
    drop(store);

    let output = hedgeline()
        .args(["--json", "dashboard", "-c"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let dashboard: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(dashboard["failed"], 1);
    assert_eq!(dashboard["pending"], 0);
}
