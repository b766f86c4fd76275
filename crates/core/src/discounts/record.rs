//! Discount Records
//!
//! Discount definitions as they are stored: flat columns, string enums, major
//! unit amounts and a JSON promotion configuration. Records are resolved into
//! [`DiscountDefinition`]s once, when they are loaded.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    context::resolve_id,
    discounts::{
        DiscountDefinition, DiscountId, SimpleDiscount, StackingPolicy, StoreId,
        eligibility::CustomerEligibility,
        limits::{UsageLimits, ValidityWindow},
        targeting::{AppliesTo, Targeting},
    },
    money::{MoneyParseError, money_from_major},
    promotions::Promotion,
    rules::{PromotionRule, RuleMetadata},
};

/// Errors resolving a stored discount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Discount values cannot be negative.
    #[error("discount {code} has a negative value")]
    NegativeValue {
        /// Discount code.
        code: String,
    },

    /// Percentage discounts cannot exceed 100%.
    #[error("discount {code} takes more than 100% off")]
    PercentOutOfRange {
        /// Discount code.
        code: String,
    },

    /// An amount could not be held in minor units.
    #[error(transparent)]
    Amount(#[from] MoneyParseError),
}

/// How a discount's value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is percentage points.
    Percentage,

    /// `value` is a major-unit amount.
    Fixed,
}

impl DiscountKind {
    /// Stored name of the discount kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    /// Parse a stored discount kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "percentage" => Some(Self::Percentage),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Stored customer eligibility mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityMode {
    /// Anyone.
    #[default]
    All,

    /// New customers and guests.
    NewCustomersOnly,

    /// Members of the allowed groups.
    SpecificGroups,

    /// The allowed customers.
    SpecificCustomers,
}

impl EligibilityMode {
    /// Stored name of the eligibility mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NewCustomersOnly => "new_customers_only",
            Self::SpecificGroups => "specific_groups",
            Self::SpecificCustomers => "specific_customers",
        }
    }

    /// Parse a stored eligibility mode.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "all" => Some(Self::All),
            "new_customers_only" => Some(Self::NewCustomersOnly),
            "specific_groups" => Some(Self::SpecificGroups),
            "specific_customers" => Some(Self::SpecificCustomers),
            _ => None,
        }
    }
}

/// A stored promotion rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Rule type, e.g. `cart_subtotal`.
    pub rule_type: String,

    /// Operator, e.g. `greater_than`.
    pub operator: String,

    /// Operator payload.
    pub value: String,

    /// Scoping data for item-level rules.
    #[serde(default)]
    pub metadata: RuleMetadata,
}

impl RuleRecord {
    /// Resolve the rule.
    pub fn to_rule(&self) -> PromotionRule {
        PromotionRule::parse(&self.rule_type, &self.operator, &self.value, &self.metadata)
    }
}

const fn active_by_default() -> bool {
    true
}

/// A stored discount definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRecord {
    /// Identifier; derived from the code when absent.
    #[serde(default)]
    pub id: Option<String>,

    /// Discount code.
    pub code: String,

    /// Percentage or fixed.
    #[serde(rename = "type")]
    pub kind: DiscountKind,

    /// Percentage points or major-unit amount.
    pub value: Decimal,

    /// Switched on.
    #[serde(default = "active_by_default")]
    pub is_active: bool,

    /// Start of the validity window.
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,

    /// Global usage cap.
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Per-customer usage cap.
    #[serde(default)]
    pub per_customer_limit: Option<u32>,

    /// Uses recorded so far.
    #[serde(default)]
    pub current_usage: u32,

    /// Minimum subtotal, in major units.
    #[serde(default)]
    pub minimum_order: Option<Decimal>,

    /// Targeting mode.
    #[serde(default)]
    pub applies_to: AppliesTo,

    /// Included product, category or brand ids.
    #[serde(default)]
    pub included_ids: Vec<String>,

    /// Excluded product ids.
    #[serde(default)]
    pub excluded_product_ids: Vec<String>,

    /// Eligibility mode.
    #[serde(default)]
    pub customer_eligibility: EligibilityMode,

    /// Groups allowed under `specific_groups`.
    #[serde(default)]
    pub allowed_customer_group_ids: Vec<String>,

    /// Customers allowed under `specific_customers`.
    #[serde(default)]
    pub allowed_customer_ids: Vec<String>,

    /// Restricted to a customer's first order.
    #[serde(default)]
    pub first_order_only: bool,

    /// Promotion type name.
    #[serde(default)]
    pub promotion_type: Option<String>,

    /// Promotion configuration.
    #[serde(default)]
    pub target_config: Option<Value>,

    /// May stack with others.
    #[serde(default)]
    pub is_stackable: bool,

    /// Stacking priority, ascending.
    #[serde(default)]
    pub priority: i32,

    /// Ends the stacking pass once admitted.
    #[serde(default)]
    pub stop_further_rules: bool,

    /// Applied without a code.
    #[serde(default)]
    pub is_automatic: bool,

    /// Rules that must all pass.
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
}

impl DiscountRecord {
    /// Create a record with default settings.
    #[must_use]
    pub fn new(code: impl Into<String>, kind: DiscountKind, value: Decimal) -> Self {
        Self {
            id: None,
            code: code.into(),
            kind,
            value,
            is_active: true,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            per_customer_limit: None,
            current_usage: 0,
            minimum_order: None,
            applies_to: AppliesTo::All,
            included_ids: Vec::new(),
            excluded_product_ids: Vec::new(),
            customer_eligibility: EligibilityMode::All,
            allowed_customer_group_ids: Vec::new(),
            allowed_customer_ids: Vec::new(),
            first_order_only: false,
            promotion_type: None,
            target_config: None,
            is_stackable: false,
            priority: 0,
            stop_further_rules: false,
            is_automatic: false,
            rules: Vec::new(),
        }
    }

    /// The discount identifier: the stored id, or one derived from the code.
    pub fn discount_id(&self) -> DiscountId {
        self.id
            .as_deref()
            .map_or_else(|| resolve_id(&self.code.to_ascii_lowercase()), resolve_id)
    }

    /// Resolve the record into a definition for a store.
    ///
    /// Promotion configurations and rules never fail to resolve here; they are
    /// kept in their unusable forms and contribute nothing when evaluated.
    ///
    /// # Errors
    ///
    /// Returns an error for negative values, percentages above 100 or amounts
    /// that do not fit in minor units.
    pub fn into_definition(
        self,
        store_id: StoreId,
        currency: &'static Currency,
    ) -> Result<DiscountDefinition<'static>, RecordError> {
        if self.value.is_sign_negative() && !self.value.is_zero() {
            return Err(RecordError::NegativeValue { code: self.code });
        }

        let discount = match self.kind {
            DiscountKind::Percentage if self.value > Decimal::ONE_HUNDRED => {
                return Err(RecordError::PercentOutOfRange { code: self.code });
            }
            DiscountKind::Percentage => SimpleDiscount::percentage_points(self.value),
            DiscountKind::Fixed => SimpleDiscount::AmountOff(money_from_major(self.value, currency)?),
        };

        let minimum_order = self
            .minimum_order
            .map(|minimum| money_from_major(minimum, currency))
            .transpose()?;

        let promotion = self.promotion_type.as_deref().map(|promotion_type| {
            Promotion::resolve(promotion_type, self.target_config.as_ref().unwrap_or(&Value::Null))
        });

        let id = self.discount_id();

        Ok(DiscountDefinition {
            id,
            store_id,
            discount,
            is_active: self.is_active,
            window: ValidityWindow {
                starts_at: self.starts_at,
                expires_at: self.expires_at,
            },
            limits: UsageLimits {
                usage_limit: self.usage_limit,
                per_customer_limit: self.per_customer_limit,
                current_usage: self.current_usage,
            },
            minimum_order,
            targeting: Targeting::specific(self.applies_to, resolve_all(&self.included_ids))
                .excluding(resolve_all(&self.excluded_product_ids)),
            eligibility: match self.customer_eligibility {
                EligibilityMode::All => CustomerEligibility::All,
                EligibilityMode::NewCustomersOnly => CustomerEligibility::NewCustomersOnly,
                EligibilityMode::SpecificGroups => CustomerEligibility::SpecificGroups(
                    resolve_all(&self.allowed_customer_group_ids).collect(),
                ),
                EligibilityMode::SpecificCustomers => CustomerEligibility::SpecificCustomers(
                    resolve_all(&self.allowed_customer_ids).collect(),
                ),
            },
            first_order_only: self.first_order_only,
            promotion,
            stacking: StackingPolicy {
                is_stackable: self.is_stackable,
                priority: self.priority,
                stop_further_rules: self.stop_further_rules,
            },
            is_automatic: self.is_automatic,
            rules: self.rules.iter().map(RuleRecord::to_rule).collect(),
            code: self.code,
        })
    }
}

fn resolve_all(keys: &[String]) -> impl Iterator<Item = Uuid> + '_ {
    keys.iter().map(|key| resolve_id(key))
}
