//! Monetary types for price and volume representation.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume (notional or share quantity) represented as a Decimal for precision.
pub type Volume = Decimal;

/// Decimal places kept on amounts derived from floating-point curve math.
pub const AMOUNT_SCALE: u32 = 8;

/// Amounts at or below this are treated as fully consumed.
pub const DUST: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// One basis point expressed as a fraction.
pub const BASIS_POINT: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Convert a basis-point count into a fraction (100 bps = 0.01).
#[must_use]
pub fn bps(value: u32) -> Decimal {
    Decimal::from(value) * BASIS_POINT
}

/// Convert a float produced by curve math into a rounded Decimal.
///
/// Returns `None` for non-finite inputs.
#[must_use]
pub fn from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(|d| d.round_dp(AMOUNT_SCALE))
}

/// Convert a Decimal into a float for curve math.
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn constants_have_expected_values() {
        assert_eq!(DUST, dec!(0.000001));
        assert_eq!(BASIS_POINT, dec!(0.0001));
    }

    #[test]
    fn bps_converts_to_fraction() {
        assert_eq!(bps(100), dec!(0.01));
        assert_eq!(bps(0), Decimal::ZERO);
    }

    #[test]
    fn from_f64_rounds_and_rejects_non_finite() {
        assert_eq!(from_f64(0.123456789123), Some(dec!(0.12345679)));
        assert_eq!(from_f64(f64::NAN), None);
        assert_eq!(from_f64(f64::INFINITY), None);
    }
}
