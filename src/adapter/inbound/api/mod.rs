//! HTTP API over the engine.
//!
//! - `POST /trades` - match and commit a trade
//! - `GET /hedge/config` - read the hedge configuration
//! - `PUT /hedge/config` - change one allow-listed key
//! - `GET /risk/dashboard` - aggregated hedge and exposure view
//! - `GET /risk/exposure` - per-outcome exposure positions
//! - `POST /risk/snapshot` - persist a risk snapshot now
//! - `POST /recovery/sweep` - run one recovery pass now
//! - `GET /health` - liveness

pub mod error;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::application::engine::Engine;
use crate::application::exposure::ExposureTotals;
use crate::domain::exposure::ExposurePosition;
use crate::domain::snapshot::RiskSnapshot;
use crate::error::{Error, Result};
use crate::port::inbound::config::HedgeConfig;
use crate::port::inbound::risk::{RiskDashboard, SweepSummary};
use crate::port::inbound::trade::{TradeExecution, TradeRequest};

pub use error::ApiError;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Body of `PUT /hedge/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub key: String,
    /// String, number, or boolean.
    pub value: Value,
}

/// Body of `GET /risk/exposure`.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureView {
    pub positions: Vec<ExposurePosition>,
    pub totals: ExposureTotals,
}

/// Build the router.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trades", post(submit_trade))
        .route("/hedge/config", get(get_hedge_config).put(put_hedge_config))
        .route("/risk/dashboard", get(dashboard))
        .route("/risk/exposure", get(exposure))
        .route("/risk/snapshot", post(snapshot))
        .route("/recovery/sweep", post(sweep))
        .with_state(engine)
}

/// Serve the API on `bind` until `shutdown` resolves.
///
/// # Errors
///
/// Fails when the address cannot be bound.
pub async fn serve<F>(engine: Arc<Engine>, bind: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::Io)
}

async fn health() -> &'static str {
    "ok"
}

async fn submit_trade(
    State(engine): State<Arc<Engine>>,
    Json(request): Json<TradeRequest>,
) -> ApiResult<TradeExecution> {
    Ok(Json(engine.submit_trade(&request).await?))
}

async fn get_hedge_config(State(engine): State<Arc<Engine>>) -> Json<HedgeConfig> {
    Json(engine.hedge_config().as_ref().clone())
}

async fn put_hedge_config(
    State(engine): State<Arc<Engine>>,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult<HedgeConfig> {
    let value = match update.value {
        Value::String(text) => text,
        other => other.to_string(),
    };
    let config = engine.set_hedge_config(&update.key, &value)?;
    Ok(Json(config.as_ref().clone()))
}

async fn dashboard(State(engine): State<Arc<Engine>>) -> ApiResult<RiskDashboard> {
    Ok(Json(engine.dashboard()?))
}

async fn exposure(State(engine): State<Arc<Engine>>) -> Json<ExposureView> {
    let (positions, totals) = engine.exposure();
    Json(ExposureView { positions, totals })
}

async fn snapshot(State(engine): State<Arc<Engine>>) -> ApiResult<RiskSnapshot> {
    Ok(Json(engine.snapshot()?))
}

async fn sweep(State(engine): State<Arc<Engine>>) -> ApiResult<SweepSummary> {
    Ok(Json(engine.sweep()?))
}
