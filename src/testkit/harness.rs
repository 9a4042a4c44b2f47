//! A fully wired engine over in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::adapter::outbound::ledger::MemoryLedger;
use crate::adapter::outbound::memory::MemoryStore;
use crate::application::engine::Engine;
use crate::domain::hedge::HedgeOrder;
use crate::domain::id::UserId;
use crate::infrastructure::bootstrap::{assemble, Adapters, Assembly};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::store::HedgeStore;

use super::reference::ScriptedReference;

/// Polling interval while waiting for hedge workers.
const POLL: Duration = Duration::from_millis(5);

pub struct Harness {
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<MemoryLedger>,
    pub reference: Arc<ScriptedReference>,
    assembly: Assembly,
}

impl Harness {
    /// Assemble an engine. Must be called inside a Tokio runtime.
    pub fn start(config: Config, reference: ScriptedReference) -> Self {
        Self::with_store(config, reference, Arc::new(MemoryStore::new()))
    }

    /// Assemble over an existing store, e.g. to test restarts.
    pub fn with_store(config: Config, reference: ScriptedReference, store: Arc<MemoryStore>) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let reference = Arc::new(reference);
        let assembly = assemble(
            &config,
            Adapters {
                store: store.clone(),
                ledger: ledger.clone(),
                reference: reference.clone(),
            },
        )
        .expect("engine assembles");
        Self {
            config,
            store,
            ledger,
            reference,
            assembly,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        self.assembly.engine()
    }

    /// Credit collateral to `user`.
    pub fn fund(&self, user: &str, amount: Decimal) {
        self.ledger
            .fund(&UserId::new(user), &self.config.engine.collateral_token, amount);
    }

    pub fn balance(&self, user: &str, token: &str) -> Decimal {
        self.ledger.balance_of(&UserId::new(user), token)
    }

    /// Wait until at least `count` hedges are terminal; returns every hedge.
    pub async fn wait_for_resolved(&self, count: usize) -> Vec<HedgeOrder> {
        for _ in 0..2_000 {
            let hedges = self.store.list_hedges().expect("list hedges");
            let resolved = hedges
                .iter()
                .filter(|hedge| hedge.status().is_terminal())
                .count();
            if resolved >= count {
                return hedges;
            }
            tokio::time::sleep(POLL).await;
        }
        panic!("fewer than {count} hedges resolved in time");
    }

    /// Stop the worker pool, draining queued hedges.
    pub async fn shutdown(self) {
        self.assembly.shutdown().await;
    }
}
