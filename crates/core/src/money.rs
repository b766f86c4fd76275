//! Money helpers
//!
//! All supported currencies carry two minor digits, so conversion between
//! configured major amounts (e.g. `49.99`) and minor units is a fixed scale.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use thiserror::Error;

/// Number of decimal places between major and minor units.
const MINOR_DIGITS: u32 = 2;

/// Errors raised while reading monetary values from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    /// The currency code is not one the engine supports.
    #[error("unsupported currency code: {0}")]
    UnknownCurrency(String),

    /// The amount could not be represented in minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The price string was not `AMOUNT CURRENCY`.
    #[error("expected format 'AMOUNT CURRENCY', got: {0}")]
    InvalidFormat(String),
}

/// Look up a supported currency by ISO code.
///
/// # Errors
///
/// Returns [`MoneyParseError::UnknownCurrency`] for any code other than GBP, USD or EUR.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, MoneyParseError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        _ => Err(MoneyParseError::UnknownCurrency(code.to_string())),
    }
}

/// Convert a major-unit amount (e.g. `12.50`) into minor units, rounding half away from zero.
///
/// # Errors
///
/// Returns [`MoneyParseError::InvalidAmount`] if the amount is out of range.
pub fn major_to_minor(amount: Decimal) -> Result<i64, MoneyParseError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| MoneyParseError::InvalidAmount(amount.to_string()))
}

/// Convert minor units into a major-unit decimal.
#[must_use]
pub fn minor_to_major(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_DIGITS)
}

/// Build money from a major-unit amount.
///
/// # Errors
///
/// Returns [`MoneyParseError::InvalidAmount`] if the amount is out of range.
pub fn money_from_major(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, MoneyParseError> {
    Ok(Money::from_minor(major_to_minor(amount)?, currency))
}

/// Parse a price string such as `"2.99 GBP"`.
///
/// # Errors
///
/// Returns an error if the string is not `AMOUNT CURRENCY`, the amount is not a
/// decimal, or the currency is unsupported.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, MoneyParseError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(MoneyParseError::InvalidFormat(s.to_string()));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| MoneyParseError::InvalidAmount(s.to_string()))?;

    money_from_major(amount, currency_from_code(code)?)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        let price = parse_price("2.99 GBP")?;

        assert_eq!(price, Money::from_minor(299, GBP));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert_eq!(
            parse_price("2.99 XYZ"),
            Err(MoneyParseError::UnknownCurrency("XYZ".to_string()))
        );
    }

    #[test]
    fn parse_price_rejects_missing_currency() {
        assert!(matches!(
            parse_price("2.99"),
            Err(MoneyParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn major_to_minor_rounds_half_away_from_zero() -> TestResult {
        assert_eq!(major_to_minor(Decimal::new(12_345, 3))?, 1235);
        assert_eq!(major_to_minor(Decimal::new(100, 0))?, 10_000);

        Ok(())
    }

    #[test]
    fn minor_to_major_keeps_two_digits() {
        assert_eq!(minor_to_major(4999).to_string(), "49.99");
    }
}
