//! Hedge configuration contract.
//!
//! The full tunable set is readable as one value; writes go through a closed
//! allow-list of keys, one key/value pair at a time.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Process-wide hedge thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeConfig {
    /// Master switch. When false every hedge is recorded as failed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Refuse hedges priced within this many bps of 0 or 1.
    #[serde(default = "default_min_spread_bps", alias = "minSpreadBps")]
    pub min_spread_bps: u32,
    /// Price concession allowed on the reference market.
    #[serde(default = "default_max_slippage_bps", alias = "maxSlippageBps")]
    pub max_slippage_bps: u32,
    /// Cap on pending (not yet hedged) notional.
    #[serde(default = "default_max_unhedged_exposure", alias = "maxUnhedgedExposure")]
    pub max_unhedged_exposure: Decimal,
    /// Cap on a single hedge's notional.
    #[serde(default = "default_max_position_size", alias = "maxPositionSize")]
    pub max_position_size: Decimal,
    /// Bound on each reference market call.
    #[serde(default = "default_hedge_timeout_ms", alias = "hedgeTimeoutMs")]
    pub hedge_timeout_ms: u64,
    /// Dispatch attempts allowed per hedge, including requeues.
    #[serde(default = "default_retry_attempts", alias = "retryAttempts")]
    pub retry_attempts: u32,
}

const fn default_enabled() -> bool {
    true
}

const fn default_min_spread_bps() -> u32 {
    50
}

const fn default_max_slippage_bps() -> u32 {
    100
}

fn default_max_unhedged_exposure() -> Decimal {
    Decimal::from(50_000)
}

fn default_max_position_size() -> Decimal {
    Decimal::from(5_000)
}

const fn default_hedge_timeout_ms() -> u64 {
    5_000
}

const fn default_retry_attempts() -> u32 {
    3
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_spread_bps: default_min_spread_bps(),
            max_slippage_bps: default_max_slippage_bps(),
            max_unhedged_exposure: default_max_unhedged_exposure(),
            max_position_size: default_max_position_size(),
            hedge_timeout_ms: default_hedge_timeout_ms(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl HedgeConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_spread_bps >= 5_000 {
            return Err(ConfigError::InvalidValue {
                field: "min_spread_bps",
                reason: "must be below 5000".to_string(),
            });
        }
        if self.max_slippage_bps >= 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "max_slippage_bps",
                reason: "must be below 10000".to_string(),
            });
        }
        if self.max_unhedged_exposure < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "max_unhedged_exposure",
                reason: "must be 0 or greater".to_string(),
            });
        }
        if self.max_position_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "max_position_size",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.hedge_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "hedge_timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// A copy with one key replaced, validated.
    ///
    /// # Errors
    ///
    /// Fails when the value does not parse or the result does not validate.
    pub fn with(&self, key: HedgeConfigKey, value: &str) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        let value = value.trim();
        match key {
            HedgeConfigKey::Enabled => next.enabled = parse_value(key, value)?,
            HedgeConfigKey::MinSpreadBps => next.min_spread_bps = parse_value(key, value)?,
            HedgeConfigKey::MaxSlippageBps => next.max_slippage_bps = parse_value(key, value)?,
            HedgeConfigKey::MaxUnhedgedExposure => {
                next.max_unhedged_exposure = parse_value(key, value)?;
            }
            HedgeConfigKey::MaxPositionSize => next.max_position_size = parse_value(key, value)?,
            HedgeConfigKey::HedgeTimeoutMs => next.hedge_timeout_ms = parse_value(key, value)?,
            HedgeConfigKey::RetryAttempts => next.retry_attempts = parse_value(key, value)?,
        }
        next.validate()?;
        Ok(next)
    }
}

fn parse_value<T: FromStr>(key: HedgeConfigKey, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        field: key.as_str(),
        reason: e.to_string(),
    })
}

/// The write allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HedgeConfigKey {
    Enabled,
    MinSpreadBps,
    MaxSlippageBps,
    MaxUnhedgedExposure,
    MaxPositionSize,
    HedgeTimeoutMs,
    RetryAttempts,
}

impl HedgeConfigKey {
    pub const ALL: [Self; 7] = [
        Self::Enabled,
        Self::MinSpreadBps,
        Self::MaxSlippageBps,
        Self::MaxUnhedgedExposure,
        Self::MaxPositionSize,
        Self::HedgeTimeoutMs,
        Self::RetryAttempts,
    ];

    /// Stable snake_case name, as used in the TOML file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::MinSpreadBps => "min_spread_bps",
            Self::MaxSlippageBps => "max_slippage_bps",
            Self::MaxUnhedgedExposure => "max_unhedged_exposure",
            Self::MaxPositionSize => "max_position_size",
            Self::HedgeTimeoutMs => "hedge_timeout_ms",
            Self::RetryAttempts => "retry_attempts",
        }
    }

    /// camelCase name, as used by the HTTP interface.
    #[must_use]
    pub const fn camel_case(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::MinSpreadBps => "minSpreadBps",
            Self::MaxSlippageBps => "maxSlippageBps",
            Self::MaxUnhedgedExposure => "maxUnhedgedExposure",
            Self::MaxPositionSize => "maxPositionSize",
            Self::HedgeTimeoutMs => "hedgeTimeoutMs",
            Self::RetryAttempts => "retryAttempts",
        }
    }
}

impl fmt::Display for HedgeConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HedgeConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s || key.camel_case() == s)
            .ok_or_else(|| ConfigError::UnknownKey { key: s.to_string() })
    }
}
