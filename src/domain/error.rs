//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors and state transitions
//! that validate inputs.
//!
//! # Examples
//!
//! ```
//! use hedgeline::domain::curve::LmsrCurve;
//! use hedgeline::domain::error::DomainError;
//!
//! let result = LmsrCurve::new(0.0);
//! assert!(matches!(result, Err(DomainError::NonPositiveLiquidity { .. })));
//! ```

use thiserror::Error;

use super::hedge::HedgeStatus;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// The LMSR liquidity parameter must be strictly positive and finite.
    #[error("liquidity parameter must be positive, got {liquidity}")]
    NonPositiveLiquidity {
        /// The invalid liquidity parameter.
        liquidity: f64,
    },

    /// Markets must have at least two outcomes.
    #[error("market {market_id} needs at least two outcomes, got {count}")]
    TooFewOutcomes {
        /// The market being constructed.
        market_id: String,
        /// Number of outcomes supplied.
        count: usize,
    },

    /// Binary markets have exactly two outcomes.
    #[error("binary market {market_id} must have exactly two outcomes, got {count}")]
    NotBinary {
        /// The market being constructed.
        market_id: String,
        /// Number of outcomes supplied.
        count: usize,
    },

    /// Outcome identifiers must be unique within a market.
    #[error("duplicate outcome {outcome_id} in market {market_id}")]
    DuplicateOutcome {
        /// The market being constructed.
        market_id: String,
        /// The repeated outcome.
        outcome_id: String,
    },

    /// Multi-outcome probabilities must be positive and sum to one.
    #[error("probabilities for market {market_id} must be positive and sum to 1, got sum {sum}")]
    InvalidProbabilities {
        /// The market being constructed.
        market_id: String,
        /// The observed sum.
        sum: f64,
    },

    /// A price outside the open interval (0, 1).
    #[error("price must be strictly between 0 and 1, got {price}")]
    InvalidPrice {
        /// The rejected price.
        price: rust_decimal::Decimal,
    },

    /// Amounts used for trading must be positive.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: rust_decimal::Decimal,
    },

    /// A fill would push an order's filled amount above its requested amount.
    #[error("fill of {amount} exceeds remaining {remaining} on order {order_id}")]
    Overfill {
        /// The order being filled.
        order_id: String,
        /// The attempted fill amount.
        amount: rust_decimal::Decimal,
        /// The amount still open on the order.
        remaining: rust_decimal::Decimal,
    },

    /// Closed orders are immutable.
    #[error("order {order_id} is closed")]
    OrderClosed {
        /// The closed order.
        order_id: String,
    },

    /// Limit orders need a limit price to rest in the book.
    #[error("order {order_id} has no limit price and cannot rest")]
    MissingLimitPrice {
        /// The offending order.
        order_id: String,
    },

    /// Hedge orders only leave the pending state once.
    #[error("hedge {hedge_id} cannot move from {from} to {to}")]
    IllegalHedgeTransition {
        /// The hedge being transitioned.
        hedge_id: String,
        /// Current state.
        from: HedgeStatus,
        /// Requested state.
        to: HedgeStatus,
    },

    /// An internal outcome with no external instrument.
    #[error("outcome {outcome_id} of market {market_id} has no instrument mapping")]
    MissingMapping {
        /// The market.
        market_id: String,
        /// The unmapped outcome.
        outcome_id: String,
    },

    /// An internal outcome mapped more than once.
    #[error("outcome {outcome_id} of market {market_id} is mapped more than once")]
    DuplicateMapping {
        /// The market.
        market_id: String,
        /// The duplicated outcome.
        outcome_id: String,
    },

    /// One external instrument claimed by several internal outcomes.
    #[error("instrument {instrument_id} is mapped by both {first} and {second}")]
    AmbiguousInstrument {
        /// The shared external instrument.
        instrument_id: String,
        /// First `market/outcome` claiming it.
        first: String,
        /// Second `market/outcome` claiming it.
        second: String,
    },
}
