use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown configuration key: {key}")]
    UnknownKey { key: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Balance service errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("insufficient {token} balance for {user_id}: need {required}, have {available}")]
    InsufficientBalance {
        user_id: String,
        token: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Rejections on the trade path. Every variant is raised before any state
/// is mutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("limit price must be strictly between 0 and 1, got {price}")]
    InvalidPrice { price: Decimal },

    #[error("limit orders need a limit price")]
    MissingLimitPrice,

    #[error("unknown market: {market_id}")]
    UnknownMarket { market_id: String },

    #[error("unknown outcome {outcome_id} in market {market_id}")]
    UnknownOutcome {
        market_id: String,
        outcome_id: String,
    },

    #[error("order of {amount} exceeds maximum order size {max}")]
    OrderTooLarge { amount: Decimal, max: Decimal },

    #[error("insufficient {token} balance: need {required}, have {available}")]
    InsufficientBalance {
        token: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient liquidity in market {market_id}")]
    InsufficientLiquidity { market_id: String },

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl TradeError {
    /// Stable machine-readable reason.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidPrice { .. } => "invalid_price",
            Self::MissingLimitPrice => "missing_limit_price",
            Self::UnknownMarket { .. } => "unknown_market",
            Self::UnknownOutcome { .. } => "unknown_outcome",
            Self::OrderTooLarge { .. } => "order_too_large",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::InsufficientLiquidity { .. } => "insufficient_liquidity",
            Self::Ledger(_) => "ledger_unavailable",
            Self::Domain(_) => "internal",
        }
    }

    /// HTTP status: 4xx for caller mistakes and resource shortfalls, 5xx otherwise.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. }
            | Self::InvalidPrice { .. }
            | Self::MissingLimitPrice
            | Self::OrderTooLarge { .. } => 400,
            Self::UnknownMarket { .. } | Self::UnknownOutcome { .. } => 404,
            Self::InsufficientBalance { .. } | Self::InsufficientLiquidity { .. } => 422,
            Self::Ledger(_) => 503,
            Self::Domain(_) => 500,
        }
    }
}

impl From<LedgerError> for TradeError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance {
                token,
                required,
                available,
                ..
            } => Self::InsufficientBalance {
                token,
                required,
                available,
            },
            LedgerError::Unavailable(message) => Self::Ledger(message),
        }
    }
}

/// Hedge dispatch errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HedgeError {
    #[error("hedging disabled")]
    Disabled,

    #[error("risk limit exceeded: {reason}")]
    LimitExceeded { reason: String },

    #[error("no instrument mapped for {market_id}/{outcome_id}")]
    Unmapped {
        market_id: String,
        outcome_id: String,
    },

    #[error("reference market error: {0}")]
    External(String),

    #[error("reference market timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("hedge store error: {0}")]
    Store(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Hedge(#[from] HedgeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for HedgeError {
    fn from(err: Error) -> Self {
        match err {
            Error::Hedge(inner) => inner,
            Error::Domain(inner) => Self::Domain(inner),
            other => Self::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn validation_errors_are_client_errors() {
        let err = TradeError::InvalidAmount { amount: dec!(0) };
        assert_eq!(err.code(), "invalid_amount");
        assert_eq!(err.status_code(), 400);

        let err = TradeError::UnknownMarket {
            market_id: "x".into(),
        };
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn ledger_shortfall_maps_to_insufficient_balance() {
        let err: TradeError = LedgerError::InsufficientBalance {
            user_id: "alice".into(),
            token: "USDC".into(),
            required: dec!(10),
            available: dec!(3),
        }
        .into();
        assert_eq!(err.code(), "insufficient_balance");
        assert_eq!(err.status_code(), 422);

        let err: TradeError = LedgerError::Unavailable("down".into()).into();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn crate_error_unwraps_into_hedge_error() {
        let err = Error::Database("locked".into());
        assert!(matches!(HedgeError::from(err), HedgeError::Store(_)));
        let err = Error::Hedge(HedgeError::Timeout { ms: 5 });
        assert_eq!(HedgeError::from(err), HedgeError::Timeout { ms: 5 });
    }
}
