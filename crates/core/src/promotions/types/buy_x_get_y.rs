//! Buy X Get Y Promotion
//!
//! Every complete set of `buy_quantity + get_quantity` units in the supplied
//! lines earns `get_quantity` discounted units. The discount goes to the
//! cheapest units first; lines with equal unit prices keep their input order.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    context::CartLine,
    discounts::{DiscountError, percent_of_minor},
    promotions::{
        ConfigError, PromotionDetails, PromotionError, PromotionOutcome, types::percent_points,
    },
};

#[derive(Debug, Deserialize)]
struct BuyXGetYConfig {
    buy_quantity: u32,
    get_quantity: u32,
    get_discount_percent: Decimal,
    #[serde(default)]
    max_applications: Option<u32>,
}

/// A buy X get Y promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyXGetY {
    buy_quantity: u32,
    get_quantity: u32,
    discount: Percentage,
    max_applications: Option<u32>,
}

impl BuyXGetY {
    /// Create a buy X get Y promotion.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is empty or the percentage is outside 0-100.
    pub fn new(
        buy_quantity: u32,
        get_quantity: u32,
        get_discount_percent: Decimal,
        max_applications: Option<u32>,
    ) -> Result<Self, ConfigError> {
        if buy_quantity == 0 && get_quantity == 0 {
            return Err(ConfigError::EmptySet);
        }

        Ok(Self {
            buy_quantity,
            get_quantity,
            discount: percent_points(get_discount_percent)?,
            max_applications,
        })
    }

    /// Resolve from a stored configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is malformed.
    pub fn from_config(config: &Value) -> Result<Self, ConfigError> {
        let config = BuyXGetYConfig::deserialize(config)?;

        Self::new(
            config.buy_quantity,
            config.get_quantity,
            config.get_discount_percent,
            config.max_applications,
        )
    }

    /// Units in one complete set.
    fn set_size(&self) -> u64 {
        u64::from(self.buy_quantity) + u64::from(self.get_quantity)
    }

    /// Number of complete sets in `units`, capped at the maximum applications.
    pub fn sets_qualified(&self, units: u64) -> u64 {
        let sets = units / self.set_size();

        self.max_applications
            .map_or(sets, |max| sets.min(u64::from(max)))
    }

    /// Calculate the discount over the supplied lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the arithmetic overflows.
    pub fn calculate<'a>(
        &self,
        items: &[CartLine<'a>],
        subtotal: Money<'a, Currency>,
    ) -> Result<PromotionOutcome<'a>, PromotionError> {
        let units = items.iter().map(|line| u64::from(line.quantity())).sum();
        let sets_qualified = self.sets_qualified(units);

        let mut remaining = sets_qualified.saturating_mul(u64::from(self.get_quantity));

        let mut cheapest_first: Vec<&CartLine<'a>> = items.iter().collect();
        cheapest_first.sort_by_key(|line| line.price().to_minor_units());

        let mut amount: i64 = 0;

        for line in cheapest_first {
            if remaining == 0 {
                break;
            }

            let discounted = remaining.min(u64::from(line.quantity()));
            let per_unit = percent_of_minor(&self.discount, line.price().to_minor_units())?;

            amount = i64::try_from(discounted)
                .ok()
                .and_then(|units| per_unit.checked_mul(units))
                .and_then(|line_discount| amount.checked_add(line_discount))
                .ok_or(DiscountError::Overflow)?;

            remaining -= discounted;
        }

        Ok(PromotionOutcome {
            amount: Money::from_minor(amount, subtotal.currency()),
            details: Some(PromotionDetails::BuyXGetY { sets_qualified }),
        })
    }
}
