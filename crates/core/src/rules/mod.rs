//! Promotion Rules
//!
//! Conditional tests attached to a discount definition. A discount's rules are
//! conjunctive: every rule must pass, and an empty rule set always passes.
//!
//! Rules are resolved once, when a definition is loaded, into a
//! [`RuleSubject`] (what to read from the [`RuleContext`]) and a
//! [`RuleCondition`] (how to compare it). A rule that cannot be resolved is
//! kept as [`PromotionRule::Unsupported`] and never passes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    context::{CategoryId, ProductId, RuleContext, resolve_id},
    money::minor_to_major,
};

mod condition;

pub use condition::{RuleActual, RuleCondition, RuleValue};

/// Errors found while resolving a rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleDefinitionError {
    /// The rule type is not one the engine knows.
    #[error("unknown rule type: {0}")]
    UnknownRuleType(String),

    /// The operator is not one the engine knows.
    #[error("unknown rule operator: {0}")]
    UnknownOperator(String),

    /// A `between` payload was not `"min,max"`.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// An item-level rule is missing its scoping metadata.
    #[error("rule type {rule_type} requires metadata key {key}")]
    MissingMetadata {
        /// Rule type being resolved.
        rule_type: String,

        /// Metadata key that was absent.
        key: &'static str,
    },
}

/// Scoping data for item-level rule types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleMetadata {
    /// Product counted by `product_quantity` rules.
    pub product_id: Option<String>,

    /// Category counted by `category_quantity` rules.
    pub category_id: Option<String>,
}

/// The context value a rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSubject {
    /// Cart subtotal, in major units.
    CartSubtotal,

    /// Total units in the cart.
    CartQuantity,

    /// Units of one product in the cart.
    ProductQuantity(ProductId),

    /// Units in the cart belonging to one category.
    CategoryQuantity(CategoryId),

    /// The customer's groups.
    CustomerGroup,

    /// The customer's completed order count.
    CustomerOrderCount,

    /// Shipping destination country.
    ShippingCountry,

    /// Day of the week, 0 (Sunday) to 6.
    DayOfWeek,

    /// Hour of the day, 0 to 23.
    HourOfDay,
}

impl RuleSubject {
    /// Resolve a subject from its rule type name and metadata.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown rule types, or item-level rule types without
    /// their scoping metadata.
    pub fn parse(rule_type: &str, metadata: &RuleMetadata) -> Result<Self, RuleDefinitionError> {
        let missing = |key| RuleDefinitionError::MissingMetadata {
            rule_type: rule_type.to_string(),
            key,
        };

        let subject = match rule_type.trim() {
            "cart_subtotal" => Self::CartSubtotal,
            "cart_quantity" => Self::CartQuantity,
            "product_quantity" => Self::ProductQuantity(
                metadata
                    .product_id
                    .as_deref()
                    .map(resolve_id)
                    .ok_or_else(|| missing("product_id"))?,
            ),
            "category_quantity" => Self::CategoryQuantity(
                metadata
                    .category_id
                    .as_deref()
                    .map(resolve_id)
                    .ok_or_else(|| missing("category_id"))?,
            ),
            "customer_group" => Self::CustomerGroup,
            "customer_order_count" => Self::CustomerOrderCount,
            "shipping_country" => Self::ShippingCountry,
            "day_of_week" => Self::DayOfWeek,
            "hour_of_day" => Self::HourOfDay,
            other => return Err(RuleDefinitionError::UnknownRuleType(other.to_string())),
        };

        Ok(subject)
    }

    /// Read the subject's value from the context.
    ///
    /// Returns `None` when the part of the context the subject needs is absent.
    pub fn resolve(&self, context: &RuleContext<'_>) -> Option<RuleActual> {
        let actual = match self {
            Self::CartSubtotal => RuleActual::One(RuleValue::number(minor_to_major(
                context.cart.as_ref()?.subtotal().to_minor_units(),
            ))),
            Self::CartQuantity => count(context.cart.as_ref()?.quantity()),
            Self::ProductQuantity(product) => count(
                context
                    .cart
                    .as_ref()?
                    .items()
                    .iter()
                    .filter(|line| line.product() == *product)
                    .map(|line| u64::from(line.quantity()))
                    .sum(),
            ),
            Self::CategoryQuantity(category) => count(
                context
                    .cart
                    .as_ref()?
                    .items()
                    .iter()
                    .filter(|line| line.in_category(*category))
                    .map(|line| u64::from(line.quantity()))
                    .sum(),
            ),
            Self::CustomerGroup => RuleActual::Many(
                context
                    .customer
                    .as_ref()?
                    .groups
                    .iter()
                    .map(|group| RuleValue::new(&group.to_string()))
                    .collect(),
            ),
            Self::CustomerOrderCount => count(u64::from(context.customer.as_ref()?.total_orders)),
            Self::ShippingCountry => {
                RuleActual::One(RuleValue::new(&context.shipping.as_ref()?.country))
            }
            Self::DayOfWeek => count(
                u64::try_from(context.datetime?.day_of_week.to_sunday_zero_offset()).ok()?,
            ),
            Self::HourOfDay => count(u64::try_from(context.datetime?.hour).ok()?),
        };

        Some(actual)
    }
}

fn count(value: u64) -> RuleActual {
    RuleActual::One(RuleValue::number(Decimal::from(value)))
}

/// A single conditional test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionRule {
    /// A resolved rule.
    Check {
        /// What the rule reads.
        subject: RuleSubject,

        /// How the value is compared.
        condition: RuleCondition,
    },

    /// A rule whose definition could not be resolved. Never passes.
    Unsupported(RuleDefinitionError),
}

impl PromotionRule {
    /// Resolve a rule from its stored fields. Never fails: unresolvable rules
    /// become [`PromotionRule::Unsupported`].
    #[must_use]
    pub fn parse(rule_type: &str, operator: &str, value: &str, metadata: &RuleMetadata) -> Self {
        let resolved = RuleSubject::parse(rule_type, metadata).and_then(|subject| {
            let condition = RuleCondition::parse(operator, value)?;

            // Group payloads are keys, compared against resolved group ids.
            let condition = if subject == RuleSubject::CustomerGroup {
                condition.map_values(|group| RuleValue::new(&resolve_id(group.as_str()).to_string()))
            } else {
                condition
            };

            Ok(Self::Check { subject, condition })
        });

        resolved.unwrap_or_else(Self::Unsupported)
    }

    /// Evaluate the rule. Fails closed when the context lacks what the rule needs.
    pub fn evaluate(&self, context: &RuleContext<'_>) -> bool {
        match self {
            Self::Check { subject, condition } => subject
                .resolve(context)
                .is_some_and(|actual| condition.matches(&actual)),
            Self::Unsupported(_) => false,
        }
    }
}

/// Whether every rule passes. An empty rule set passes.
pub fn rules_pass(rules: &[PromotionRule], context: &RuleContext<'_>) -> bool {
    rules.iter().all(|rule| rule.evaluate(context))
}
