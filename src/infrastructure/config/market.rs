//! Market definitions and their explicit instrument mapping.
//!
//! Each `[[markets]]` entry lists its outcomes together with the external
//! instrument every outcome hedges into:
//!
//! ```toml
//! [[markets]]
//! id = "fed-cut-march"
//! question = "Will the Fed cut rates in March?"
//!
//! [[markets.outcomes]]
//! id = "yes"
//! external_instrument_id = "0xabc-yes"
//! display_name = "Yes"
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::curve::LmsrCurve;
use crate::domain::error::DomainError;
use crate::domain::id::{InstrumentId, MarketId};
use crate::domain::mapping::{InstrumentMap, InstrumentMapping};
use crate::domain::market::{Market, Outcome};

/// Curve representation of a market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    /// Two outcomes, tracked as a pair of quantities.
    #[default]
    Binary,
    /// Two or more outcomes, seeded from probabilities.
    Multi,
}

/// One outcome and the instrument it hedges into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeConfig {
    pub id: String,
    pub external_instrument_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl OutcomeConfig {
    fn display_name(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// One configured market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub kind: MarketKind,
    /// Overrides `engine.liquidity` for this market.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
    /// Initial probabilities for multi-outcome markets, in outcome order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
    pub outcomes: Vec<OutcomeConfig>,
}

impl MarketConfig {
    /// Build the domain market.
    ///
    /// # Errors
    ///
    /// Invalid liquidity, wrong outcome count for a binary market, duplicate
    /// outcomes, or probabilities that do not sum to one.
    pub fn build(&self, default_liquidity: f64) -> Result<Market, DomainError> {
        let curve = LmsrCurve::new(self.liquidity.unwrap_or(default_liquidity))?;
        let id = MarketId::new(self.id.clone());
        let mut outcomes: Vec<Outcome> = self
            .outcomes
            .iter()
            .map(|outcome| Outcome::new(outcome.id.clone(), outcome.display_name()))
            .collect();

        match self.kind {
            MarketKind::Binary => {
                if outcomes.len() != 2 {
                    return Err(DomainError::TooFewOutcomes {
                        market_id: self.id.clone(),
                        count: outcomes.len(),
                    });
                }
                let no = outcomes.remove(1);
                let yes = outcomes.remove(0);
                Market::binary(id, self.question.clone(), yes, no, curve)
            }
            MarketKind::Multi => Market::multi(
                id,
                self.question.clone(),
                outcomes,
                self.probabilities.clone(),
                curve,
            ),
        }
    }

    /// The explicit mapping entries declared by this market.
    #[must_use]
    pub fn mappings(&self) -> Vec<InstrumentMapping> {
        self.outcomes
            .iter()
            .map(|outcome| InstrumentMapping {
                market_id: MarketId::new(self.id.clone()),
                outcome_id: outcome.id.clone().into(),
                instrument_id: InstrumentId::new(outcome.external_instrument_id.clone()),
                display_name: outcome.display_name(),
            })
            .collect()
    }
}

/// Validated mapping across all configured markets.
///
/// # Errors
///
/// A shared instrument or a doubly mapped outcome.
pub fn instrument_map(markets: &[MarketConfig]) -> Result<InstrumentMap, DomainError> {
    InstrumentMap::new(markets.iter().flat_map(MarketConfig::mappings))
}
