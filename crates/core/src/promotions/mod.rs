//! Promotions
//!
//! Promotion behaviour attached to a discount definition. The stored
//! `promotion_type` and its JSON `target_config` are resolved once, when the
//! definition is loaded, into a [`Promotion`]. Unknown types and malformed
//! configurations are kept rather than rejected: they calculate to nothing so a
//! misconfigured promotion never breaks checkout.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    context::{CartLine, ProductId},
    discounts::{DiscountError, SimpleDiscount},
    money::MoneyParseError,
};

pub mod types;

pub use types::{
    bundle::Bundle,
    buy_x_get_y::BuyXGetY,
    free_gift::FreeGift,
    tiered::{Tier, Tiered},
};

/// Promotion type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// Buy some units, get others discounted.
    BuyXGetY,

    /// Subtotal thresholds mapped to percentages.
    Tiered,

    /// A set of products bought together.
    Bundle,

    /// Free products above a minimum spend.
    FreeGift,
}

impl PromotionKind {
    /// Stored name of the promotion type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuyXGetY => "buy_x_get_y",
            Self::Tiered => "tiered",
            Self::Bundle => "bundle",
            Self::FreeGift => "free_gift",
        }
    }

    /// Parse a stored promotion type.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "buy_x_get_y" => Some(Self::BuyXGetY),
            "tiered" => Some(Self::Tiered),
            "bundle" => Some(Self::Bundle),
            "free_gift" => Some(Self::FreeGift),
            _ => None,
        }
    }
}

/// Reasons a promotion configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration did not have the expected shape.
    #[error("invalid configuration: {0}")]
    Shape(String),

    /// `buy_quantity + get_quantity` is zero.
    #[error("buy_quantity and get_quantity are both zero")]
    EmptySet,

    /// A percentage outside 0-100.
    #[error("discount percent out of range: {0}")]
    PercentOutOfRange(Decimal),

    /// A bundle without required products.
    #[error("bundle has no required products")]
    EmptyBundle,

    /// An amount that cannot be held in minor units.
    #[error(transparent)]
    Amount(#[from] MoneyParseError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        Self::Shape(error.to_string())
    }
}

/// Errors from a promotion calculation.
#[derive(Debug, Error)]
pub enum PromotionError {
    /// The promotion type is unknown.
    #[error("unrecognized promotion type: {0}")]
    Unrecognized(String),

    /// The configuration for a known type was rejected at load.
    #[error("{kind:?} promotion is misconfigured: {source}")]
    Misconfigured {
        /// Promotion type.
        kind: PromotionKind,

        /// Why the configuration was rejected.
        source: ConfigError,
    },

    /// Arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Resolved promotion behaviour.
#[derive(Debug, Clone, PartialEq)]
pub enum Promotion {
    /// Buy X, get Y discounted.
    BuyXGetY(BuyXGetY),

    /// Highest qualifying subtotal tier.
    Tiered(Tiered),

    /// All required products present.
    Bundle(Bundle),

    /// Free products above a minimum spend.
    FreeGift(FreeGift),

    /// A promotion type the engine does not know.
    Unrecognized(String),

    /// A known type whose configuration was rejected.
    Misconfigured {
        /// Promotion type.
        kind: PromotionKind,

        /// Why the configuration was rejected.
        error: ConfigError,
    },
}

impl Promotion {
    /// Resolve a stored promotion type and configuration. Never fails.
    #[must_use]
    pub fn resolve(promotion_type: &str, config: &Value) -> Self {
        let Some(kind) = PromotionKind::parse(promotion_type) else {
            return Self::Unrecognized(promotion_type.to_string());
        };

        let resolved = match kind {
            PromotionKind::BuyXGetY => BuyXGetY::from_config(config).map(Self::BuyXGetY),
            PromotionKind::Tiered => Tiered::from_config(config).map(Self::Tiered),
            PromotionKind::Bundle => Bundle::from_config(config).map(Self::Bundle),
            PromotionKind::FreeGift => FreeGift::from_config(config).map(Self::FreeGift),
        };

        resolved.unwrap_or_else(|error| Self::Misconfigured { kind, error })
    }

    /// Calculate the promotion's effect on a cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] for unrecognized or misconfigured
    /// promotions and for arithmetic failures.
    pub fn calculate<'a>(
        &self,
        discount: &SimpleDiscount<'a>,
        items: &[CartLine<'a>],
        subtotal: Money<'a, Currency>,
    ) -> Result<PromotionOutcome<'a>, PromotionError> {
        match self {
            Self::BuyXGetY(promotion) => promotion.calculate(items, subtotal),
            Self::Tiered(promotion) => promotion.calculate(subtotal),
            Self::Bundle(promotion) => promotion.calculate(discount, items, subtotal),
            Self::FreeGift(promotion) => Ok(promotion.calculate(subtotal)),
            Self::Unrecognized(kind) => Err(PromotionError::Unrecognized(kind.clone())),
            Self::Misconfigured { kind, error } => Err(PromotionError::Misconfigured {
                kind: *kind,
                source: error.clone(),
            }),
        }
    }
}

/// Amount and explanation produced by a promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionOutcome<'a> {
    /// Amount taken off the cart.
    pub amount: Money<'a, Currency>,

    /// Explanation, absent when the promotion contributed nothing because it
    /// could not be calculated.
    pub details: Option<PromotionDetails>,
}

impl<'a> PromotionOutcome<'a> {
    /// A zero amount without details.
    #[must_use]
    pub fn nothing(currency: &'a Currency) -> Self {
        Self {
            amount: Money::from_minor(0, currency),
            details: None,
        }
    }
}

/// The tier a tiered promotion reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSummary {
    /// Subtotal threshold, in major units.
    pub threshold: Decimal,

    /// Percentage points taken off.
    pub discount_percent: Decimal,
}

/// Structured explanation of a promotion's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionDetails {
    /// Buy X get Y.
    BuyXGetY {
        /// Complete buy + get sets, after the application cap.
        sets_qualified: u64,
    },

    /// Tiered.
    Tiered {
        /// Highest qualifying tier.
        tier_reached: Option<TierSummary>,
    },

    /// Bundle.
    Bundle {
        /// Every required product is present.
        bundle_complete: bool,
    },

    /// Free gift.
    FreeGift {
        /// The minimum purchase was reached.
        qualified: bool,

        /// Products to add to the cart at no charge.
        free_product_ids: Vec<ProductId>,
    },
}
