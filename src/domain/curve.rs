//! Logarithmic market scoring rule (LMSR) pricing curve.
//!
//! For quantities `q` and liquidity parameter `b`:
//!
//! - Cost function: `C(q) = b * ln(sum(exp(q_i/b)))`
//! - Price of outcome `i`: `P_i = exp(q_i/b) / sum_k(exp(q_k/b))`
//! - Cost of a trade: `C(q_after) - C(q_before)`
//! - Binary inverse: `q = b * ln(p / (1 - p))`
//!
//! Every function here is pure. Callers own the quantity vector and commit
//! the returned deltas themselves. All sums are evaluated with the max-shift
//! (log-sum-exp) trick so large quantities do not overflow.

use super::error::DomainError;
use super::order::Side;

/// Lowest price the curve will report or trade towards.
pub const PRICE_FLOOR: f64 = 1e-6;

/// Highest price the curve will report or trade towards.
pub const PRICE_CEILING: f64 = 1.0 - PRICE_FLOOR;

/// Result of pricing a notional trade against the curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveQuote {
    /// Instantaneous price of the outcome before the trade.
    pub price_before: f64,
    /// Shares bought or sold for exactly the quoted notional.
    pub shares: f64,
    /// Instantaneous price of the outcome after the trade.
    pub price_after: f64,
}

/// LMSR automated market maker with a fixed liquidity parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmsrCurve {
    liquidity: f64,
}

impl LmsrCurve {
    /// Create a curve, rejecting non-positive or non-finite liquidity.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveLiquidity`] when `liquidity <= 0`.
    pub fn new(liquidity: f64) -> Result<Self, DomainError> {
        if !liquidity.is_finite() || liquidity <= 0.0 {
            return Err(DomainError::NonPositiveLiquidity { liquidity });
        }
        Ok(Self { liquidity })
    }

    /// The liquidity parameter `b`.
    #[must_use]
    pub const fn liquidity(&self) -> f64 {
        self.liquidity
    }

    /// Market cost `C(q)`.
    #[must_use]
    pub fn cost(&self, q: &[f64]) -> f64 {
        if q.is_empty() {
            return 0.0;
        }
        let b = self.liquidity;
        let m = max_quantity(q);
        let sum: f64 = q.iter().map(|qi| ((qi - m) / b).exp()).sum();
        m + b * sum.ln()
    }

    /// Probability vector implied by `q`. Always sums to 1.
    #[must_use]
    pub fn prices(&self, q: &[f64]) -> Vec<f64> {
        if q.is_empty() {
            return Vec::new();
        }
        let b = self.liquidity;
        let m = max_quantity(q);
        let exps: Vec<f64> = q.iter().map(|qi| ((qi - m) / b).exp()).collect();
        let sum: f64 = exps.iter().sum();
        exps.iter().map(|e| e / sum).collect()
    }

    /// Price of a single outcome, clamped to `[PRICE_FLOOR, PRICE_CEILING]`.
    #[must_use]
    pub fn price(&self, q: &[f64], outcome: usize) -> f64 {
        self.prices(q)
            .get(outcome)
            .copied()
            .unwrap_or(PRICE_FLOOR)
            .clamp(PRICE_FLOOR, PRICE_CEILING)
    }

    /// Price a trade of `notional` collateral on `outcome`.
    ///
    /// A buy spends exactly `notional`; a sell receives exactly `notional`.
    /// Returns `None` when the amount is not positive or, for sells, when
    /// the curve cannot pay out that much.
    #[must_use]
    pub fn quote(&self, q: &[f64], outcome: usize, side: Side, notional: f64) -> Option<CurveQuote> {
        if outcome >= q.len() || !notional.is_finite() || notional <= 0.0 {
            return None;
        }
        let b = self.liquidity;
        let m = max_quantity(q);
        let others = others_sum(q, outcome, m, b);
        let shifted_cost = self.cost(q) - m;

        let inner = match side {
            Side::Buy => ((shifted_cost + notional) / b).exp() - others,
            Side::Sell => ((shifted_cost - notional) / b).exp() - others,
        };
        if !inner.is_finite() || inner <= 0.0 {
            return None;
        }

        let target = m + b * inner.ln();
        let shares = match side {
            Side::Buy => target - q[outcome],
            Side::Sell => q[outcome] - target,
        };
        if !shares.is_finite() || shares <= 0.0 {
            return None;
        }

        let mut after = q.to_vec();
        after[outcome] = target;
        Some(CurveQuote {
            price_before: self.price(q, outcome),
            shares,
            price_after: self.price(&after, outcome),
        })
    }

    /// Notional needed to move `outcome`'s price to `target` in the direction of `side`.
    ///
    /// Returns zero when the price is already at or beyond the target.
    #[must_use]
    pub fn notional_to_price(&self, q: &[f64], outcome: usize, side: Side, target: f64) -> f64 {
        let Some(current) = self.prices(q).get(outcome).copied() else {
            return 0.0;
        };
        let target = target.clamp(PRICE_FLOOR, PRICE_CEILING);
        let already_there = match side {
            Side::Buy => current >= target,
            Side::Sell => current <= target,
        };
        if already_there {
            return 0.0;
        }
        let Some(quantity) = self.quantity_for_price(q, outcome, target) else {
            return 0.0;
        };

        let mut moved = q.to_vec();
        moved[outcome] = quantity;
        let delta = match side {
            Side::Buy => self.cost(&moved) - self.cost(q),
            Side::Sell => self.cost(q) - self.cost(&moved),
        };
        delta.max(0.0)
    }

    /// Quantity `outcome` must hold, others fixed, for its price to equal `target`.
    #[must_use]
    pub fn quantity_for_price(&self, q: &[f64], outcome: usize, target: f64) -> Option<f64> {
        if outcome >= q.len() {
            return None;
        }
        let b = self.liquidity;
        let p = target.clamp(PRICE_FLOOR, PRICE_CEILING);
        let m = max_quantity(q);
        let others = others_sum(q, outcome, m, b);
        if others <= 0.0 {
            return None;
        }
        Some(m + b * (p * others / (1.0 - p)).ln())
    }

    /// Binary inverse: the YES quantity (with NO at zero) that prices YES at `p`.
    ///
    /// `p` is clamped away from 0 and 1 so the logit stays finite.
    #[must_use]
    pub fn quantity_from_probability(&self, p: f64) -> f64 {
        let p = p.clamp(PRICE_FLOOR, PRICE_CEILING);
        self.liquidity * (p / (1.0 - p)).ln()
    }

    /// Quantities reproducing an arbitrary probability vector (`q_i = b * ln(p_i)`).
    #[must_use]
    pub fn quantities_from_probabilities(&self, probabilities: &[f64]) -> Vec<f64> {
        probabilities
            .iter()
            .map(|p| self.liquidity * p.max(PRICE_FLOOR).ln())
            .collect()
    }
}

fn max_quantity(q: &[f64]) -> f64 {
    q.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// `sum_{j != i} exp((q_j - m) / b)`.
fn others_sum(q: &[f64], outcome: usize, m: f64, b: f64) -> f64 {
    q.iter()
        .enumerate()
        .filter(|(j, _)| *j != outcome)
        .map(|(_, qj)| ((qj - m) / b).exp())
        .sum()
}
