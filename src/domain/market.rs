//! Markets, their outcomes, and the curve state each one carries.
//!
//! Binary markets keep two scalar quantities (`q_yes`, `q_no`). Multi-outcome
//! markets keep a probability per outcome and derive curve quantities from it
//! on demand. Either way the implied probabilities sum to one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::curve::LmsrCurve;
use super::error::DomainError;
use super::fill::Fill;
use super::id::{MarketId, OutcomeId};
use super::money::{to_f64, Volume};
use super::order::Side;

/// Tolerance used when validating that probabilities sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A tradable outcome of a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    id: OutcomeId,
    display_name: String,
}

impl Outcome {
    pub fn new(id: impl Into<OutcomeId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &OutcomeId {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Curve quantity state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CurveState {
    /// Two accumulated quantities; outcome 0 is YES, outcome 1 is NO.
    Binary { q_yes: f64, q_no: f64 },
    /// One probability per outcome, in outcome order.
    Multi { probabilities: Vec<f64> },
}

/// A question with two or more outcomes, priced by an LMSR curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    id: MarketId,
    question: String,
    outcomes: Vec<Outcome>,
    curve: LmsrCurve,
    state: CurveState,
}

impl Market {
    /// Create a binary market with both quantities at zero (price 0.5).
    ///
    /// # Errors
    ///
    /// Fails when the outcome ids collide.
    pub fn binary(
        id: MarketId,
        question: impl Into<String>,
        yes: Outcome,
        no: Outcome,
        curve: LmsrCurve,
    ) -> Result<Self, DomainError> {
        if yes.id == no.id {
            return Err(DomainError::DuplicateOutcome {
                market_id: id.to_string(),
                outcome_id: yes.id.to_string(),
            });
        }
        Ok(Self {
            id,
            question: question.into(),
            outcomes: vec![yes, no],
            curve,
            state: CurveState::Binary {
                q_yes: 0.0,
                q_no: 0.0,
            },
        })
    }

    /// Create a multi-outcome market.
    ///
    /// Without explicit probabilities every outcome starts equally likely.
    ///
    /// # Errors
    ///
    /// Fails with fewer than two outcomes, duplicate outcome ids, or
    /// probabilities that are not positive or do not sum to one.
    pub fn multi(
        id: MarketId,
        question: impl Into<String>,
        outcomes: Vec<Outcome>,
        probabilities: Option<Vec<f64>>,
        curve: LmsrCurve,
    ) -> Result<Self, DomainError> {
        if outcomes.len() < 2 {
            return Err(DomainError::TooFewOutcomes {
                market_id: id.to_string(),
                count: outcomes.len(),
            });
        }
        for (i, outcome) in outcomes.iter().enumerate() {
            if outcomes[..i].iter().any(|o| o.id == outcome.id) {
                return Err(DomainError::DuplicateOutcome {
                    market_id: id.to_string(),
                    outcome_id: outcome.id.to_string(),
                });
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let probabilities =
            probabilities.unwrap_or_else(|| vec![1.0 / outcomes.len() as f64; outcomes.len()]);
        let sum: f64 = probabilities.iter().sum();
        if probabilities.len() != outcomes.len()
            || probabilities.iter().any(|p| !p.is_finite() || *p <= 0.0)
            || (sum - 1.0).abs() > PROBABILITY_TOLERANCE
        {
            return Err(DomainError::InvalidProbabilities {
                market_id: id.to_string(),
                sum,
            });
        }

        Ok(Self {
            id,
            question: question.into(),
            outcomes,
            curve,
            state: CurveState::Multi { probabilities },
        })
    }

    #[must_use]
    pub fn id(&self) -> &MarketId {
        &self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    #[must_use]
    pub const fn curve(&self) -> &LmsrCurve {
        &self.curve
    }

    #[must_use]
    pub const fn state(&self) -> &CurveState {
        &self.state
    }

    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self.state, CurveState::Binary { .. })
    }

    /// Position of an outcome in the quantity vector.
    #[must_use]
    pub fn outcome_index(&self, outcome_id: &OutcomeId) -> Option<usize> {
        self.outcomes.iter().position(|o| &o.id == outcome_id)
    }

    /// Current curve quantities in outcome order.
    #[must_use]
    pub fn quantities(&self) -> Vec<f64> {
        match &self.state {
            CurveState::Binary { q_yes, q_no } => vec![*q_yes, *q_no],
            CurveState::Multi { probabilities } => {
                self.curve.quantities_from_probabilities(probabilities)
            }
        }
    }

    /// Commit a new quantity vector produced by the matcher.
    ///
    /// Vectors of the wrong length are ignored.
    pub fn set_quantities(&mut self, q: &[f64]) {
        if q.len() != self.outcomes.len() {
            return;
        }
        match &mut self.state {
            CurveState::Binary { q_yes, q_no } => {
                *q_yes = q[0];
                *q_no = q[1];
            }
            CurveState::Multi { probabilities } => {
                *probabilities = self.curve.prices(q);
            }
        }
    }

    /// Implied probabilities in outcome order.
    #[must_use]
    pub fn prices(&self) -> Vec<f64> {
        self.curve.prices(&self.quantities())
    }

    /// Clamped price of a single outcome.
    #[must_use]
    pub fn price(&self, outcome_id: &OutcomeId) -> Option<f64> {
        let index = self.outcome_index(outcome_id)?;
        Some(self.curve.price(&self.quantities(), index))
    }

    /// Move an outcome's quantity by `shares` traded against the curve.
    pub fn apply_shares(&mut self, outcome: usize, side: Side, shares: f64) {
        let mut q = self.quantities();
        let Some(slot) = q.get_mut(outcome) else {
            return;
        };
        match side {
            Side::Buy => *slot += shares,
            Side::Sell => *slot -= shares,
        }
        self.set_quantities(&q);
    }

    /// Reset a binary market to the quantity state implied by an observed
    /// YES price, using the inverse curve (NO quantity at zero).
    ///
    /// # Errors
    ///
    /// Fails on multi-outcome markets.
    pub fn reconcile_binary(&mut self, yes_price: f64) -> Result<(), DomainError> {
        match &mut self.state {
            CurveState::Binary { q_yes, q_no } => {
                *q_yes = self.curve.quantity_from_probability(yes_price);
                *q_no = 0.0;
                Ok(())
            }
            CurveState::Multi { .. } => Err(DomainError::NotBinary {
                market_id: self.id.to_string(),
                count: self.outcomes.len(),
            }),
        }
    }

    /// Outcome order and kind, without curve state.
    #[must_use]
    pub fn layout(&self) -> MarketLayout {
        MarketLayout {
            outcomes: self.outcomes.iter().map(|o| o.id.clone()).collect(),
            binary: self.is_binary(),
        }
    }

    /// Rebuild curve quantities by replaying curve fills in commit order.
    ///
    /// Book fills and fills of other markets are skipped.
    pub fn replay<'a>(&mut self, fills: impl IntoIterator<Item = &'a Fill>) {
        let mut ordered: Vec<&Fill> = fills
            .into_iter()
            .filter(|fill| fill.is_curve() && fill.market_id == self.id)
            .collect();
        ordered.sort_by_key(|fill| fill.sequence);
        for fill in ordered {
            if let Some(index) = self.outcome_index(&fill.outcome_id) {
                self.apply_shares(index, fill.side, to_f64(fill.shares));
            }
        }
    }

    /// See [`MarketLayout::exposure_delta`].
    #[must_use]
    pub fn exposure_delta(
        &self,
        outcome_id: &OutcomeId,
        side: Side,
        amount: Volume,
    ) -> Option<(OutcomeId, Decimal)> {
        self.layout().exposure_delta(outcome_id, side, amount)
    }
}

/// The parts of a market needed to sign exposure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketLayout {
    pub outcomes: Vec<OutcomeId>,
    pub binary: bool,
}

impl MarketLayout {
    /// The exposure key and signed notional for a curve fill or its hedge.
    ///
    /// Binary markets carry a single directional figure keyed on YES: buying
    /// YES or selling NO adds to it, buying NO or selling YES subtracts.
    /// Multi-outcome markets key on the traded outcome (buy adds, sell
    /// subtracts).
    #[must_use]
    pub fn exposure_delta(
        &self,
        outcome_id: &OutcomeId,
        side: Side,
        amount: Volume,
    ) -> Option<(OutcomeId, Decimal)> {
        let index = self.outcomes.iter().position(|o| o == outcome_id)?;
        let signed = match side {
            Side::Buy => amount,
            Side::Sell => -amount,
        };
        if self.binary {
            let yes = self.outcomes.first()?.clone();
            let delta = if index == 0 { signed } else { -signed };
            Some((yes, delta))
        } else {
            Some((outcome_id.clone(), signed))
        }
    }
}
