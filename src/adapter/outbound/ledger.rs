//! In-memory balance ledger.
//!
//! Stands in for the external balance service in local runs and tests.
//! A batch is netted per (user, token) and checked in full before anything
//! is written, so a rejected batch leaves every balance untouched.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::id::UserId;
use crate::error::LedgerError;
use crate::port::outbound::ledger::{Ledger, LedgerEntry};

/// Balances held in process memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: Mutex<HashMap<(UserId, String), Decimal>>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a user directly, outside any trade.
    pub fn fund(&self, user_id: &UserId, token: &str, amount: Decimal) {
        let mut balances = self.balances.lock();
        *balances
            .entry((user_id.clone(), token.to_string()))
            .or_insert(Decimal::ZERO) += amount;
    }

    #[must_use]
    pub fn balance_of(&self, user_id: &UserId, token: &str) -> Decimal {
        self.balances
            .lock()
            .get(&(user_id.clone(), token.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn balance(&self, user_id: &UserId, token: &str) -> Result<Decimal, LedgerError> {
        Ok(self.balance_of(user_id, token))
    }

    async fn apply(&self, entries: &[LedgerEntry]) -> Result<(), LedgerError> {
        let mut net: Vec<((UserId, String), Decimal)> = Vec::new();
        for entry in entries {
            let key = (entry.user_id.clone(), entry.token.clone());
            match net.iter_mut().find(|(k, _)| *k == key) {
                Some((_, delta)) => *delta += entry.delta,
                None => net.push((key, entry.delta)),
            }
        }

        let mut balances = self.balances.lock();
        for ((user_id, token), delta) in &net {
            let available = balances
                .get(&(user_id.clone(), token.clone()))
                .copied()
                .unwrap_or(Decimal::ZERO);
            if available + *delta < Decimal::ZERO {
                return Err(LedgerError::InsufficientBalance {
                    user_id: user_id.to_string(),
                    token: token.clone(),
                    required: -*delta,
                    available,
                });
            }
        }
        for (key, delta) in net {
            *balances.entry(key).or_insert(Decimal::ZERO) += delta;
        }
        debug!(entries = entries.len(), "Ledger batch applied");
        Ok(())
    }
}
