//! Balance service port.
//!
//! The engine never holds funds itself. Collateral and outcome shares live in
//! an external ledger addressed by (user, token).

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::id::{MarketId, OutcomeId, UserId};
use crate::error::LedgerError;

/// Token name under which a user's shares of an outcome are held.
#[must_use]
pub fn share_token(market_id: &MarketId, outcome_id: &OutcomeId) -> String {
    format!("{market_id}:{outcome_id}")
}

/// One signed balance change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user_id: UserId,
    pub token: String,
    /// Positive credits, negative debits.
    pub delta: Decimal,
}

impl LedgerEntry {
    pub fn credit(user_id: UserId, token: impl Into<String>, amount: Decimal) -> Self {
        Self {
            user_id,
            token: token.into(),
            delta: amount,
        }
    }

    pub fn debit(user_id: UserId, token: impl Into<String>, amount: Decimal) -> Self {
        Self {
            user_id,
            token: token.into(),
            delta: -amount,
        }
    }
}

/// Balance service consumed by the matcher.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current balance of one token.
    async fn balance(&self, user_id: &UserId, token: &str) -> Result<Decimal, LedgerError>;

    /// Apply a batch of entries atomically.
    ///
    /// Either every entry is applied or none is. A batch that would leave any
    /// balance negative is rejected with [`LedgerError::InsufficientBalance`].
    async fn apply(&self, entries: &[LedgerEntry]) -> Result<(), LedgerError>;
}
