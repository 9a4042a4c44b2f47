//! Shared hedge configuration with atomic reload.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::ConfigError;
use crate::port::inbound::config::{HedgeConfig, HedgeConfigKey};

/// Holder of the process-wide [`HedgeConfig`].
///
/// Readers take a cheap `Arc` snapshot and keep it for the whole attempt, so
/// a concurrent write never changes the thresholds mid-hedge.
#[derive(Debug)]
pub struct HedgeSettings {
    current: RwLock<Arc<HedgeConfig>>,
}

impl HedgeSettings {
    /// # Errors
    ///
    /// Rejects configurations that do not validate.
    pub fn new(config: HedgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<HedgeConfig> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a whole new configuration.
    ///
    /// # Errors
    ///
    /// Rejects configurations that do not validate; the current value is kept.
    pub fn reload(&self, config: HedgeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.current.write() = Arc::new(config);
        info!("Hedge configuration reloaded");
        Ok(())
    }

    /// Change one allow-listed key.
    ///
    /// # Errors
    ///
    /// Unknown keys, unparsable values, and values that fail validation.
    pub fn set(&self, key: &str, value: &str) -> Result<Arc<HedgeConfig>, ConfigError> {
        let key: HedgeConfigKey = key.parse()?;
        let mut guard = self.current.write();
        let next = Arc::new(guard.with(key, value)?);
        *guard = Arc::clone(&next);
        info!(key = %key, value = %value, "Hedge configuration changed");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn set_is_visible_to_later_snapshots_only() {
        let settings = HedgeSettings::new(HedgeConfig::default()).unwrap();
        let before = settings.snapshot();
        settings.set("maxPositionSize", "10").unwrap();
        assert_eq!(before.max_position_size, dec!(5000));
        assert_eq!(settings.snapshot().max_position_size, dec!(10));
    }

    #[test]
    fn rejected_write_keeps_current_value() {
        let settings = HedgeSettings::new(HedgeConfig::default()).unwrap();
        assert!(matches!(
            settings.set("leverage", "3"),
            Err(ConfigError::UnknownKey { .. })
        ));
        assert!(settings.set("hedgeTimeoutMs", "0").is_err());
        assert_eq!(settings.snapshot().hedge_timeout_ms, 5000);
    }

    #[test]
    fn reload_swaps_whole_value() {
        let settings = HedgeSettings::new(HedgeConfig::default()).unwrap();
        let next = HedgeConfig {
            enabled: false,
            retry_attempts: 9,
            ..HedgeConfig::default()
        };
        settings.reload(next.clone()).unwrap();
        assert_eq!(*settings.snapshot(), next);

        let invalid = HedgeConfig {
            max_position_size: dec!(0),
            ..HedgeConfig::default()
        };
        assert!(settings.reload(invalid).is_err());
        assert!(!settings.snapshot().enabled);
    }
}
