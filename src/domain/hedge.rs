//! Hedge orders and their state machine.
//!
//! A hedge is created `pending` together with the internal fill it covers and
//! leaves that state exactly once, to `placed` or `failed`. Both are terminal.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{FillId, HedgeId, InstrumentId, MarketId, OrderId, OutcomeId};
use super::money::{Price, Volume};
use super::order::Side;

/// Longest failure reason kept on a hedge, in characters.
pub const MAX_REASON_LEN: usize = 256;

/// Reason recorded when hedging is switched off.
pub const REASON_DISABLED: &str = "hedging disabled";

/// Hedge lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HedgeStatus {
    Pending,
    Placed,
    Failed,
}

impl HedgeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Placed => "placed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "placed" => Some(Self::Placed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for HedgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hedge asks the reference market for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeRequest {
    pub fill_id: FillId,
    pub order_id: OrderId,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub instrument_id: InstrumentId,
    /// Same side as the user's fill: the house replicates the user's trade.
    pub side: Side,
    /// Limit price sent to the reference market.
    pub price: Price,
    /// Collateral notional of the internal fill.
    pub amount: Volume,
    /// Shares to trade externally.
    pub size: Volume,
}

/// One attempted external replication of an internal fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeOrder {
    id: HedgeId,
    request: HedgeRequest,
    status: HedgeStatus,
    external_order_id: Option<String>,
    filled_size: Volume,
    reason: Option<String>,
    attempts: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_attempt_at: Option<DateTime<Utc>>,
}

impl HedgeOrder {
    /// A fresh pending hedge.
    #[must_use]
    pub fn pending(id: HedgeId, request: HedgeRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            request,
            status: HedgeStatus::Pending,
            external_order_id: None,
            filled_size: Decimal::ZERO,
            reason: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
            last_attempt_at: None,
        }
    }

    /// Rebuild a hedge from persisted fields.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn restore(
        id: HedgeId,
        request: HedgeRequest,
        status: HedgeStatus,
        external_order_id: Option<String>,
        filled_size: Volume,
        reason: Option<String>,
        attempts: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        last_attempt_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            request,
            status,
            external_order_id,
            filled_size,
            reason,
            attempts,
            created_at,
            updated_at,
            last_attempt_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> &HedgeId {
        &self.id
    }

    #[must_use]
    pub fn request(&self) -> &HedgeRequest {
        &self.request
    }

    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        &self.request.market_id
    }

    #[must_use]
    pub fn outcome_id(&self) -> &OutcomeId {
        &self.request.outcome_id
    }

    #[must_use]
    pub const fn status(&self) -> HedgeStatus {
        self.status
    }

    #[must_use]
    pub fn external_order_id(&self) -> Option<&str> {
        self.external_order_id.as_deref()
    }

    #[must_use]
    pub const fn filled_size(&self) -> Volume {
        self.filled_size
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub const fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempt_at
    }

    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Notional actually replicated, pro rata to the external fill.
    #[must_use]
    pub fn hedged_notional(&self) -> Volume {
        if self.request.size <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let ratio = (self.filled_size / self.request.size).min(Decimal::ONE);
        self.request.amount * ratio
    }

    /// Count a dispatch attempt. Only pending hedges are attempted.
    pub fn record_attempt(&mut self, now: DateTime<Utc>) {
        if self.status == HedgeStatus::Pending {
            self.attempts = self.attempts.saturating_add(1);
            self.last_attempt_at = Some(now);
            self.updated_at = now;
        }
    }

    /// Stamp the attempt time without counting a dispatch.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if self.status == HedgeStatus::Pending {
            self.last_attempt_at = Some(now);
            self.updated_at = now;
        }
    }

    /// Move to `placed` with the venue's acknowledgement.
    ///
    /// # Errors
    ///
    /// Fails unless the hedge is pending.
    pub fn mark_placed(
        &mut self,
        external_order_id: impl Into<String>,
        filled_size: Volume,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.transition(HedgeStatus::Placed)?;
        self.external_order_id = Some(external_order_id.into());
        self.filled_size = filled_size.max(Decimal::ZERO);
        self.updated_at = now;
        Ok(())
    }

    /// Move to `failed`, keeping at most [`MAX_REASON_LEN`] characters of the reason.
    ///
    /// # Errors
    ///
    /// Fails unless the hedge is pending.
    pub fn mark_failed(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(HedgeStatus::Failed)?;
        self.reason = Some(truncate_reason(reason));
        self.updated_at = now;
        Ok(())
    }

    fn transition(&mut self, to: HedgeStatus) -> Result<(), DomainError> {
        if self.status != HedgeStatus::Pending || to == HedgeStatus::Pending {
            return Err(DomainError::IllegalHedgeTransition {
                hedge_id: self.id.to_string(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Cut a reason to [`MAX_REASON_LEN`] characters on a char boundary.
#[must_use]
pub fn truncate_reason(reason: &str) -> String {
    match reason.char_indices().nth(MAX_REASON_LEN) {
        Some((end, _)) => reason[..end].to_string(),
        None => reason.to_string(),
    }
}
