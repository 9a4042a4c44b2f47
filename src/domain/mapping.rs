//! Internal outcome to external instrument mapping.
//!
//! Mappings are validated when loaded: each internal outcome maps to exactly
//! one instrument, and no instrument is claimed by two internal outcomes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{InstrumentId, MarketId, OutcomeId};
use super::market::Market;

/// One explicit outcome mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentMapping {
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub instrument_id: InstrumentId,
    pub display_name: String,
}

/// Validated lookup from (market, outcome) to instrument.
#[derive(Debug, Clone, Default)]
pub struct InstrumentMap {
    by_outcome: HashMap<(MarketId, OutcomeId), InstrumentMapping>,
}

impl InstrumentMap {
    /// Build the map, rejecting duplicate outcomes and shared instruments.
    ///
    /// # Errors
    ///
    /// [`DomainError::DuplicateMapping`] or [`DomainError::AmbiguousInstrument`].
    pub fn new(entries: impl IntoIterator<Item = InstrumentMapping>) -> Result<Self, DomainError> {
        let mut by_outcome = HashMap::new();
        let mut owners: HashMap<InstrumentId, String> = HashMap::new();

        for entry in entries {
            let owner = format!("{}/{}", entry.market_id, entry.outcome_id);
            if let Some(first) = owners.get(&entry.instrument_id) {
                return Err(DomainError::AmbiguousInstrument {
                    instrument_id: entry.instrument_id.to_string(),
                    first: first.clone(),
                    second: owner,
                });
            }
            let key = (entry.market_id.clone(), entry.outcome_id.clone());
            if by_outcome.contains_key(&key) {
                return Err(DomainError::DuplicateMapping {
                    market_id: entry.market_id.to_string(),
                    outcome_id: entry.outcome_id.to_string(),
                });
            }
            owners.insert(entry.instrument_id.clone(), owner);
            by_outcome.insert(key, entry);
        }

        Ok(Self { by_outcome })
    }

    #[must_use]
    pub fn resolve(&self, market_id: &MarketId, outcome_id: &OutcomeId) -> Option<&InstrumentMapping> {
        self.by_outcome
            .get(&(market_id.clone(), outcome_id.clone()))
    }

    /// Check that every outcome of `market` has a mapping.
    ///
    /// # Errors
    ///
    /// [`DomainError::MissingMapping`] for the first unmapped outcome.
    pub fn ensure_covers(&self, market: &Market) -> Result<(), DomainError> {
        for outcome in market.outcomes() {
            if self.resolve(market.id(), outcome.id()).is_none() {
                return Err(DomainError::MissingMapping {
                    market_id: market.id().to_string(),
                    outcome_id: outcome.id().to_string(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_outcome.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_outcome.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(market: &str, outcome: &str, instrument: &str) -> InstrumentMapping {
        InstrumentMapping {
            market_id: MarketId::new(market),
            outcome_id: OutcomeId::new(outcome),
            instrument_id: InstrumentId::new(instrument),
            display_name: outcome.to_uppercase(),
        }
    }

    #[test]
    fn resolves_configured_outcomes() {
        let map = InstrumentMap::new([mapping("m", "yes", "x1"), mapping("m", "no", "x2")]).unwrap();
        let found = map.resolve(&MarketId::new("m"), &OutcomeId::new("no")).unwrap();
        assert_eq!(found.instrument_id.as_str(), "x2");
        assert!(map.resolve(&MarketId::new("m"), &OutcomeId::new("maybe")).is_none());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn shared_instrument_is_ambiguous() {
        let err = InstrumentMap::new([mapping("a", "yes", "x"), mapping("b", "yes", "x")]).unwrap_err();
        assert!(matches!(err, DomainError::AmbiguousInstrument { .. }));
    }

    #[test]
    fn outcome_mapped_twice_is_rejected() {
        let err = InstrumentMap::new([mapping("a", "yes", "x"), mapping("a", "yes", "y")]).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateMapping { .. }));
    }
}
