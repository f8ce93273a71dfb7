//! Money amount hygiene
//!
//! All amounts are `rust_decimal::Decimal`. This module holds the two rules
//! every amount must obey:
//!
//! 1. An amount never carries more fractional digits than its currency's
//!    minor units (validated at the workflow boundary).
//! 2. Conversion results are rounded half-even (banker's rounding) to the
//!    target currency's minor units.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::currency::CurrencyInfo;
use crate::error::BankError;

/// Validate that `amount` fits the currency's minor-unit scale.
///
/// Trailing zeros are not significant: `60.000` is a valid USD amount,
/// `60.001` is not.
///
/// # Examples
/// ```
/// use rust_decimal::Decimal;
/// use bankcore::currency::{CurrencyCode, CurrencyInfo};
/// use bankcore::money::validate_scale;
///
/// let usd = CurrencyInfo::new(CurrencyCode::new("USD").unwrap(), "US Dollar", 2);
/// assert!(validate_scale(Decimal::new(6000, 2), &usd).is_ok()); // 60.00
/// assert!(validate_scale(Decimal::new(60001, 3), &usd).is_err()); // 60.001
/// ```
pub fn validate_scale(amount: Decimal, currency: &CurrencyInfo) -> Result<(), BankError> {
    if amount.normalize().scale() > currency.minor_units {
        return Err(BankError::AmountPrecision {
            currency: currency.code.to_string(),
            max: currency.minor_units,
        });
    }
    Ok(())
}

/// Round to the currency's minor units, half-even.
///
/// Half-even keeps repeated conversions unbiased; it is applied exactly
/// once per conversion, never to stored balances.
#[inline]
pub fn round_to_minor_units(amount: Decimal, minor_units: u32) -> Decimal {
    amount.round_dp_with_strategy(minor_units, RoundingStrategy::MidpointNearestEven)
}

/// The smallest representable step of a currency (0.01 for 2 minor units).
#[inline]
pub fn one_minor_unit(minor_units: u32) -> Decimal {
    Decimal::new(1, minor_units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyCode;
    use rust_decimal_macros::dec;

    fn usd() -> CurrencyInfo {
        CurrencyInfo::new(CurrencyCode::new("USD").unwrap(), "US Dollar", 2)
    }

    fn jpy() -> CurrencyInfo {
        CurrencyInfo::new(CurrencyCode::new("JPY").unwrap(), "Japanese Yen", 0)
    }

    #[test]
    fn test_validate_scale_accepts_in_range() {
        assert!(validate_scale(dec!(60), &usd()).is_ok());
        assert!(validate_scale(dec!(60.5), &usd()).is_ok());
        assert!(validate_scale(dec!(60.00), &usd()).is_ok());
        // Trailing zeros beyond minor units are not significant
        assert!(validate_scale(dec!(60.0000), &usd()).is_ok());
        assert!(validate_scale(dec!(100), &jpy()).is_ok());
    }

    #[test]
    fn test_validate_scale_rejects_excess_precision() {
        let err = validate_scale(dec!(60.001), &usd()).unwrap_err();
        assert_eq!(
            err,
            BankError::AmountPrecision {
                currency: "USD".to_string(),
                max: 2
            }
        );

        assert!(validate_scale(dec!(100.1), &jpy()).is_err());
    }

    #[test]
    fn test_round_half_even() {
        // Midpoints round to the even neighbor
        assert_eq!(round_to_minor_units(dec!(2.345), 2), dec!(2.34));
        assert_eq!(round_to_minor_units(dec!(2.355), 2), dec!(2.36));
        assert_eq!(round_to_minor_units(dec!(100.5), 0), dec!(100));
        assert_eq!(round_to_minor_units(dec!(101.5), 0), dec!(102));
        // Non-midpoints round normally
        assert_eq!(round_to_minor_units(dec!(2.346), 2), dec!(2.35));
        assert_eq!(round_to_minor_units(dec!(2.344), 2), dec!(2.34));
        // Already in range is untouched
        assert_eq!(round_to_minor_units(dec!(54.00), 2), dec!(54.00));
    }

    #[test]
    fn test_one_minor_unit() {
        assert_eq!(one_minor_unit(2), dec!(0.01));
        assert_eq!(one_minor_unit(0), dec!(1));
    }
}
