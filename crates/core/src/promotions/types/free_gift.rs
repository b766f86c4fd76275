//! Free Gift Promotion
//!
//! Never reduces the total. When the subtotal reaches the minimum purchase the
//! caller adds the free products to the cart at no charge.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    context::{ProductId, resolve_id},
    money::major_to_minor,
    promotions::{ConfigError, PromotionDetails, PromotionOutcome},
};

#[derive(Debug, Deserialize)]
struct FreeGiftConfig {
    free_product_ids: Vec<String>,
    #[serde(default)]
    minimum_purchase: Decimal,
}

/// A free gift promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeGift {
    free_products: Vec<ProductId>,
    minimum_purchase_minor: i64,
}

impl FreeGift {
    /// Create a free gift promotion with a minimum purchase in minor units.
    pub fn new(free_products: Vec<ProductId>, minimum_purchase_minor: i64) -> Self {
        Self {
            free_products,
            minimum_purchase_minor,
        }
    }

    /// Resolve from a stored configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is malformed.
    pub fn from_config(config: &Value) -> Result<Self, ConfigError> {
        let config = FreeGiftConfig::deserialize(config)?;

        Ok(Self::new(
            config
                .free_product_ids
                .iter()
                .map(|key| resolve_id(key))
                .collect(),
            major_to_minor(config.minimum_purchase)?,
        ))
    }

    /// Returns the products given away.
    pub fn free_products(&self) -> &[ProductId] {
        &self.free_products
    }

    /// Whether a subtotal reaches the minimum purchase.
    pub fn qualifies(&self, subtotal: &Money<'_, Currency>) -> bool {
        subtotal.to_minor_units() >= self.minimum_purchase_minor
    }

    /// Calculate the outcome. The amount is always zero.
    pub fn calculate<'a>(&self, subtotal: Money<'a, Currency>) -> PromotionOutcome<'a> {
        PromotionOutcome {
            amount: Money::from_minor(0, subtotal.currency()),
            details: Some(PromotionDetails::FreeGift {
                qualified: self.qualifies(&subtotal),
                free_product_ids: self.free_products.clone(),
            }),
        }
    }
}
