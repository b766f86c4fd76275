//! Bundle Promotion

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    context::{CartLine, ProductId, resolve_id},
    discounts::SimpleDiscount,
    promotions::{ConfigError, PromotionDetails, PromotionError, PromotionOutcome},
};

#[derive(Debug, Deserialize)]
struct BundleConfig {
    required_products: Vec<String>,
}

/// A bundle of products that must all be in the cart. When complete, the
/// discount's own value applies to the subtotal.
///
/// An empty product list is a configuration error, not a bundle that is
/// always complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    required_products: FxHashSet<ProductId>,
}

impl Bundle {
    /// Create a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyBundle`] if no products are required.
    pub fn new(required_products: impl IntoIterator<Item = ProductId>) -> Result<Self, ConfigError> {
        let required_products: FxHashSet<ProductId> = required_products.into_iter().collect();

        if required_products.is_empty() {
            return Err(ConfigError::EmptyBundle);
        }

        Ok(Self { required_products })
    }

    /// Resolve from a stored configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is malformed.
    pub fn from_config(config: &Value) -> Result<Self, ConfigError> {
        let config = BundleConfig::deserialize(config)?;

        Self::new(config.required_products.iter().map(|key| resolve_id(key)))
    }

    /// Whether every required product appears among the lines.
    pub fn is_complete(&self, items: &[CartLine<'_>]) -> bool {
        self.required_products
            .iter()
            .all(|product| items.iter().any(|line| line.product() == *product))
    }

    /// Calculate the discount.
    ///
    /// # Errors
    ///
    /// Returns an error if the discount's arithmetic fails.
    pub fn calculate<'a>(
        &self,
        discount: &SimpleDiscount<'a>,
        items: &[CartLine<'a>],
        subtotal: Money<'a, Currency>,
    ) -> Result<PromotionOutcome<'a>, PromotionError> {
        let bundle_complete = self.is_complete(items);

        let amount = if bundle_complete {
            discount.amount_off(subtotal)?
        } else {
            Money::from_minor(0, subtotal.currency())
        };

        Ok(PromotionOutcome {
            amount,
            details: Some(PromotionDetails::Bundle { bundle_complete }),
        })
    }
}
