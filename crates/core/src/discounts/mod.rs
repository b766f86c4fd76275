//! Discounts
//!
//! Discount definitions, their decision methods and the arithmetic shared by
//! every promotion type.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

pub mod definition;
pub mod eligibility;
pub mod limits;
pub mod record;
pub mod targeting;

pub use definition::{DiscountDefinition, DiscountId, StackingPolicy, StoreId};
pub use record::{DiscountKind, DiscountRecord, EligibilityMode, RecordError, RuleRecord};

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Minor-unit arithmetic overflowed.
    #[error("discount amount overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// The value of a standard discount.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SimpleDiscount<'a> {
    /// Take a percentage off the subtotal (e.g., "25% off")
    PercentageOff(Percentage),

    /// Take a fixed amount off, never more than the subtotal (e.g., "£5 off")
    AmountOff(Money<'a, Currency>),
}

impl<'a> SimpleDiscount<'a> {
    /// Percentage discount from percentage points (e.g. `15` for 15%).
    #[must_use]
    pub fn percentage_points(points: Decimal) -> Self {
        Self::PercentageOff(percentage_from_points(points))
    }

    /// Discount taken off `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the percentage calculation overflows or a
    /// fixed amount is in a different currency to the subtotal.
    pub fn amount_off(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let subtotal_minor = subtotal.to_minor_units();

        let amount_minor = match self {
            Self::PercentageOff(percent) => percent_of_minor(percent, subtotal_minor)?,
            Self::AmountOff(amount) => {
                if amount.currency() != subtotal.currency() {
                    return Err(MoneyError::CurrencyMismatch {
                        expected: subtotal.currency().iso_alpha_code,
                        actual: amount.currency().iso_alpha_code,
                    }
                    .into());
                }

                amount.to_minor_units().min(subtotal_minor)
            }
        };

        Ok(Money::from_minor(amount_minor.max(0), subtotal.currency()))
    }
}

/// Convert percentage points (e.g. `20` for 20%) into a [`Percentage`].
#[must_use]
pub fn percentage_from_points(points: Decimal) -> Percentage {
    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// The result is rounded half away from zero.
///
/// # Errors
///
/// Returns an error if:
/// - The percentage calculation overflows or cannot be safely represented (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage crate doesn't actually expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
