//! Composition root: builds adapters from configuration, restores state from
//! the store, and wires the engine together.
//!
//! Restore order matters: curve quantities are replayed from curve fills in
//! commit order, resting books are rebuilt from open orders by creation time,
//! exposure is rebuilt from curve fills and placed hedges, and the commit
//! sequence resumes after the highest persisted one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapter::outbound::ledger::MemoryLedger;
use crate::adapter::outbound::memory::MemoryStore;
use crate::adapter::outbound::reference::{HttpReferenceMarket, PaperReferenceMarket};
use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::engine::Engine;
use crate::application::exposure::ExposureLedger;
use crate::application::hedge::dispatcher::HedgeDispatcher;
use crate::application::hedge::pool::{spawn_outcome_listener, HedgeOutcome, HedgeQueue, HedgeWorkerPool};
use crate::application::hedge::settings::HedgeSettings;
use crate::application::matching::HybridMatcher;
use crate::application::recovery::RecoverySweep;
use crate::application::risk::manager::RiskManager;
use crate::application::scheduler::Scheduler;
use crate::domain::book::OrderBook;
use crate::domain::hedge::HedgeStatus;
use crate::domain::id::{MarketId, UserId};
use crate::domain::market::{Market, MarketLayout};
use crate::domain::order::Order;
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::{Config, ReferenceKind};
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::reference::ReferenceMarket;
use crate::port::outbound::store::Store;

/// Outcome events buffered between hedge workers and the listener.
const OUTCOME_CHANNEL_CAPACITY: usize = 1024;

/// The outbound dependencies the engine runs against.
pub struct Adapters {
    pub store: Arc<dyn Store>,
    pub ledger: Arc<dyn Ledger>,
    pub reference: Arc<dyn ReferenceMarket>,
}

impl Adapters {
    /// Build every adapter from configuration.
    ///
    /// # Errors
    ///
    /// Database or reference market setup failures.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            store: open_store(config)?,
            ledger: build_ledger(config),
            reference: build_reference(config)?,
        })
    }
}

/// Open the configured store: SQLite when `database` is set, memory otherwise.
///
/// # Errors
///
/// Pool creation or migration failures.
pub fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.database.as_deref() {
        Some(path) => {
            let pool = create_pool(path)?;
            run_migrations(&pool)?;
            info!(database = %path, "SQLite store opened");
            Ok(Arc::new(SqliteStore::new(pool)))
        }
        None => {
            warn!("No database configured, state will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// In-memory ledger seeded with the configured opening balances.
#[must_use]
pub fn build_ledger(config: &Config) -> Arc<MemoryLedger> {
    let ledger = MemoryLedger::new();
    for account in &config.accounts {
        let token = account
            .token
            .as_deref()
            .unwrap_or(&config.engine.collateral_token);
        ledger.fund(&UserId::new(account.user_id.clone()), token, account.balance);
    }
    Arc::new(ledger)
}

/// # Errors
///
/// An invalid `base_url` for the HTTP client.
pub fn build_reference(config: &Config) -> Result<Arc<dyn ReferenceMarket>> {
    match config.reference.kind {
        ReferenceKind::Paper => Ok(Arc::new(PaperReferenceMarket::new())),
        ReferenceKind::Http => {
            let base_url = config.reference.base_url.as_deref().unwrap_or_default();
            let client = HttpReferenceMarket::new(base_url, config.reference.api_key())?;
            info!(orders_url = %client.orders_url(), "HTTP reference market configured");
            Ok(Arc::new(client))
        }
    }
}

/// Markets with their curve state and resting books restored.
pub struct Restored {
    pub markets: Vec<(Market, OrderBook)>,
    pub exposure: Arc<ExposureLedger>,
    pub last_sequence: u64,
}

impl Restored {
    #[must_use]
    pub fn layouts(&self) -> HashMap<MarketId, MarketLayout> {
        self.markets
            .iter()
            .map(|(market, _)| (market.id().clone(), market.layout()))
            .collect()
    }
}

/// Rebuild in-process state from the store.
///
/// # Errors
///
/// Invalid market configuration, a persisted order that cannot rest, or a
/// store failure.
pub fn restore(config: &Config, store: &dyn Store) -> Result<Restored> {
    let exposure = Arc::new(ExposureLedger::new());

    let mut open: HashMap<MarketId, Vec<Order>> = HashMap::new();
    for order in store.open_orders()? {
        open.entry(order.market_id().clone()).or_default().push(order);
    }

    let mut markets = Vec::with_capacity(config.markets.len());
    for mut market in config.build_markets()? {
        let fills = store.fills_for_market(market.id())?;
        market.replay(&fills);
        for fill in fills.iter().filter(|fill| fill.is_curve()) {
            if let Some((outcome_id, delta)) =
                market.exposure_delta(&fill.outcome_id, fill.side, fill.amount)
            {
                exposure.record_fill(&fill.market_id, &outcome_id, delta);
            }
        }

        let resting = open.remove(market.id()).unwrap_or_default();
        let book = OrderBook::from_orders(market.id().clone(), resting)?;
        info!(
            market_id = %market.id(),
            fills = fills.len(),
            resting = book.len(),
            "Market state restored"
        );
        markets.push((market, book));
    }
    for (market_id, orders) in &open {
        warn!(market_id = %market_id, orders = orders.len(), "Open orders for unconfigured market ignored");
    }

    let layouts: HashMap<MarketId, MarketLayout> = markets
        .iter()
        .map(|(market, _)| (market.id().clone(), market.layout()))
        .collect();
    for hedge in store.hedges_by_status(HedgeStatus::Placed)? {
        let request = hedge.request();
        let delta = layouts.get(&request.market_id).and_then(|layout| {
            layout.exposure_delta(&request.outcome_id, request.side, hedge.hedged_notional())
        });
        if let Some((outcome_id, delta)) = delta {
            exposure.record_hedge(&request.market_id, &outcome_id, delta, hedge.updated_at());
        }
    }

    Ok(Restored {
        markets,
        exposure,
        last_sequence: store.max_sequence()?,
    })
}

/// Risk and recovery services without a worker pool, for one-shot commands.
///
/// Stuck hedges found by this sweep are counted and force-failed when old
/// enough, never requeued.
pub struct Maintenance {
    pub risk: Arc<RiskManager>,
    pub sweep: Arc<RecoverySweep>,
}

impl Maintenance {
    /// # Errors
    ///
    /// Store or configuration failures.
    pub fn open(config: &Config) -> Result<Self> {
        let store = open_store(config)?;
        let restored = restore(config, store.as_ref())?;
        let settings = Arc::new(HedgeSettings::new(config.hedge.clone())?);
        let risk = Arc::new(RiskManager::new(
            Arc::clone(&settings),
            Arc::clone(&store),
            restored.exposure,
            config.schedule.recent_failure_window(),
        ));
        let sweep = Arc::new(RecoverySweep::new(
            store,
            Arc::clone(&risk),
            settings,
            None,
            config.schedule.recovery_policy(),
        ));
        Ok(Self { risk, sweep })
    }
}

/// A running engine and the background tasks it owns.
pub struct Assembly {
    engine: Arc<Engine>,
    pool: Arc<HedgeWorkerPool>,
    listener: JoinHandle<()>,
}

impl Assembly {
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Start the periodic snapshot and sweep jobs.
    #[must_use]
    pub fn start_scheduler(&self, config: &Config) -> Scheduler {
        Scheduler::start(
            Arc::clone(self.engine.risk()),
            Arc::clone(self.engine.sweeper()),
            config.schedule.schedule(),
        )
    }

    /// Drain the hedge queue and stop the outcome listener.
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
        drop(self.engine);
        if let Err(e) = self.listener.await {
            warn!(error = %e, "Hedge outcome listener ended abnormally");
        }
    }
}

/// Build adapters from configuration and assemble the engine.
///
/// # Errors
///
/// See [`Adapters::from_config`] and [`assemble`].
pub fn bootstrap(config: &Config) -> Result<Assembly> {
    assemble(config, Adapters::from_config(config)?)
}

/// Wire the engine against the given adapters. Must run inside a Tokio
/// runtime; the hedge workers and outcome listener are spawned here.
///
/// # Errors
///
/// Invalid configuration or a failure while restoring state.
pub fn assemble(config: &Config, adapters: Adapters) -> Result<Assembly> {
    let Adapters {
        store,
        ledger,
        reference,
    } = adapters;

    let mappings = Arc::new(config.instrument_map()?);
    let restored = restore(config, store.as_ref())?;
    for (market, _) in &restored.markets {
        mappings.ensure_covers(market).map_err(Error::from)?;
    }
    let layouts = Arc::new(restored.layouts());
    let exposure = Arc::clone(&restored.exposure);

    let settings = Arc::new(HedgeSettings::new(config.hedge.clone())?);
    let risk = Arc::new(RiskManager::new(
        Arc::clone(&settings),
        Arc::clone(&store),
        Arc::clone(&exposure),
        config.schedule.recent_failure_window(),
    ));

    let matcher = Arc::new(HybridMatcher::new(
        config.engine.matcher(),
        ledger,
        Arc::clone(&store),
        Arc::clone(&exposure),
    ));
    matcher.resume_sequence(restored.last_sequence);
    for (market, book) in restored.markets {
        matcher.register(market, book);
    }

    let dispatcher = Arc::new(HedgeDispatcher::new(
        Arc::clone(&store),
        reference,
        Arc::clone(&settings),
        Arc::clone(&risk),
        Arc::clone(&exposure),
        mappings,
        layouts,
    ));

    let (outcome_tx, outcome_rx) = mpsc::channel::<HedgeOutcome>(OUTCOME_CHANNEL_CAPACITY);
    let listener = spawn_outcome_listener(outcome_rx, Arc::clone(&risk));
    let pool = Arc::new(HedgeWorkerPool::start(
        Arc::clone(&dispatcher),
        config.workers.count,
        config.workers.capacity,
        Arc::new(outcome_tx),
    ));
    let queue: Arc<dyn HedgeQueue> = pool.clone();

    let pending = store.hedges_by_status(HedgeStatus::Pending)?.len();
    if pending > 0 {
        info!(pending, "Pending hedges left for the recovery sweep");
    }

    let sweep = Arc::new(RecoverySweep::new(
        Arc::clone(&store),
        Arc::clone(&risk),
        Arc::clone(&settings),
        Some(Arc::clone(&queue)),
        config.schedule.recovery_policy(),
    ));

    let engine = Arc::new(Engine::new(
        matcher,
        dispatcher,
        queue,
        settings,
        risk,
        exposure,
        sweep,
    ));
    info!(
        markets = config.markets.len(),
        last_sequence = restored.last_sequence,
        "Engine assembled"
    );

    Ok(Assembly {
        engine,
        pool,
        listener,
    })
}
