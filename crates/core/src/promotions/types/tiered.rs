//! Tiered Promotion
//!
//! Subtotal thresholds mapped to percentages. The highest threshold the
//! subtotal reaches wins.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    discounts::percent_of_minor,
    money::{major_to_minor, minor_to_major},
    promotions::{
        ConfigError, PromotionDetails, PromotionError, PromotionOutcome, TierSummary,
        types::percent_points,
    },
};

#[derive(Debug, Deserialize)]
struct TierConfig {
    threshold: Decimal,
    discount_percent: Decimal,
}

#[derive(Debug, Deserialize)]
struct TieredConfig {
    tiers: Vec<TierConfig>,
}

/// A single subtotal tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    threshold_minor: i64,
    discount_points: Decimal,
    discount: Percentage,
}

impl Tier {
    /// Create a tier from a major-unit threshold and percentage points.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is out of range or the percentage is outside 0-100.
    pub fn new(threshold: Decimal, discount_percent: Decimal) -> Result<Self, ConfigError> {
        Ok(Self {
            threshold_minor: major_to_minor(threshold)?,
            discount_points: discount_percent,
            discount: percent_points(discount_percent)?,
        })
    }

    /// Threshold in minor units.
    pub const fn threshold_minor(&self) -> i64 {
        self.threshold_minor
    }

    fn summary(&self) -> TierSummary {
        TierSummary {
            threshold: minor_to_major(self.threshold_minor),
            discount_percent: self.discount_points,
        }
    }
}

/// A tiered promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct Tiered {
    // Ascending by threshold, one tier per threshold.
    tiers: Vec<Tier>,
}

impl Tiered {
    /// Create a tiered promotion. Tiers are ordered by threshold; when two
    /// share a threshold the first listed is kept.
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by_key(Tier::threshold_minor);
        tiers.dedup_by_key(|tier| tier.threshold_minor);

        Self { tiers }
    }

    /// Resolve from a stored configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is malformed.
    pub fn from_config(config: &Value) -> Result<Self, ConfigError> {
        let config = TieredConfig::deserialize(config)?;

        let tiers = config
            .tiers
            .into_iter()
            .map(|tier| Tier::new(tier.threshold, tier.discount_percent))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(tiers))
    }

    /// Returns the tiers, ascending by threshold.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// The highest tier whose threshold is at or below `subtotal_minor`.
    pub fn tier_reached(&self, subtotal_minor: i64) -> Option<&Tier> {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.threshold_minor <= subtotal_minor)
    }

    /// Calculate the discount for a subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if the percentage calculation overflows.
    pub fn calculate<'a>(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<PromotionOutcome<'a>, PromotionError> {
        let subtotal_minor = subtotal.to_minor_units();

        let Some(tier) = self.tier_reached(subtotal_minor) else {
            return Ok(PromotionOutcome {
                amount: Money::from_minor(0, subtotal.currency()),
                details: Some(PromotionDetails::Tiered { tier_reached: None }),
            });
        };

        let amount = percent_of_minor(&tier.discount, subtotal_minor)?;

        Ok(PromotionOutcome {
            amount: Money::from_minor(amount, subtotal.currency()),
            details: Some(PromotionDetails::Tiered {
                tier_reached: Some(tier.summary()),
            }),
        })
    }
}
