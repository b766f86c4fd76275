//! Discount Definition
//!
//! A coupon or automatic promotion: its value, validity window, usage caps,
//! targeting, customer eligibility, optional promotion behaviour, stacking
//! policy and rules.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use uuid::Uuid;

use crate::{
    context::{CartLine, CustomerSnapshot},
    discounts::{
        DiscountError, SimpleDiscount,
        eligibility::{CustomerEligibility, Ineligibility},
        limits::{UsageLimits, ValidityWindow},
        targeting::Targeting,
    },
    promotions::Promotion,
    rules::PromotionRule,
};

/// Discount identifier.
pub type DiscountId = Uuid;

/// Store identifier.
pub type StoreId = Uuid;

/// How a discount interacts with others in a stacking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackingPolicy {
    /// May be applied alongside a discount already admitted.
    pub is_stackable: bool,

    /// Evaluation order, ascending.
    pub priority: i32,

    /// Once admitted, no later discount is evaluated.
    pub stop_further_rules: bool,
}

/// A discount definition.
#[derive(Debug, Clone)]
pub struct DiscountDefinition<'a> {
    /// Discount identifier.
    pub id: DiscountId,

    /// Owning store.
    pub store_id: StoreId,

    /// Code customers enter. Unique per store, matched case-insensitively.
    pub code: String,

    /// Percentage or fixed value.
    pub discount: SimpleDiscount<'a>,

    /// Switched on by the store admin.
    pub is_active: bool,

    /// Validity window.
    pub window: ValidityWindow,

    /// Usage caps and the current usage counter.
    pub limits: UsageLimits,

    /// Minimum cart subtotal.
    pub minimum_order: Option<Money<'a, Currency>>,

    /// Products the discount targets.
    pub targeting: Targeting,

    /// Customers who may use the discount.
    pub eligibility: CustomerEligibility,

    /// Only customers without a completed order may use the discount.
    pub first_order_only: bool,

    /// Promotion behaviour replacing the plain discount calculation.
    pub promotion: Option<Promotion>,

    /// Stacking policy.
    pub stacking: StackingPolicy,

    /// Applied without a code once its rules pass.
    pub is_automatic: bool,

    /// Conditions that must all pass.
    pub rules: Vec<PromotionRule>,
}

impl<'a> DiscountDefinition<'a> {
    /// Create an active, unrestricted discount.
    #[must_use]
    pub fn new(
        id: DiscountId,
        store_id: StoreId,
        code: impl Into<String>,
        discount: SimpleDiscount<'a>,
    ) -> Self {
        Self {
            id,
            store_id,
            code: code.into(),
            discount,
            is_active: true,
            window: ValidityWindow::always(),
            limits: UsageLimits::unlimited(),
            minimum_order: None,
            targeting: Targeting::all(),
            eligibility: CustomerEligibility::All,
            first_order_only: false,
            promotion: None,
            stacking: StackingPolicy::default(),
            is_automatic: false,
            rules: Vec::new(),
        }
    }

    /// Whether `code` is this discount's code, ignoring case and surrounding whitespace.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }

    /// Active and within its validity window.
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.is_active && self.window.contains(now)
    }

    /// Whether the global usage cap allows another use.
    pub fn has_remaining_usage(&self) -> bool {
        self.limits.has_remaining()
    }

    /// Whether `subtotal` reaches the minimum order.
    pub fn meets_minimum_order(&self, subtotal: &Money<'_, Currency>) -> bool {
        self.minimum_order
            .is_none_or(|minimum| subtotal.to_minor_units() >= minimum.to_minor_units())
    }

    /// Check eligibility and first-order restrictions. Guests are new customers with no groups.
    ///
    /// # Errors
    ///
    /// Returns the reason the customer cannot use the discount.
    pub fn check_customer(&self, customer: Option<&CustomerSnapshot>) -> Result<(), Ineligibility> {
        if !self.eligibility.admits(customer) {
            return Err(Ineligibility::NotEligible);
        }

        if self.first_order_only && customer.is_some_and(|customer| !customer.is_new()) {
            return Err(Ineligibility::FirstOrderOnly);
        }

        Ok(())
    }

    /// Whether the discount applies to a set of cart lines.
    pub fn applies_to_products(&self, lines: &[CartLine<'_>]) -> bool {
        self.targeting.applies_to(lines)
    }

    /// The cart lines the discount targets.
    pub fn targeted_lines(&self, lines: &[CartLine<'a>]) -> Vec<CartLine<'a>> {
        self.targeting.targeted_lines(lines)
    }

    /// Plain discount amount against a subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] on arithmetic overflow or currency mismatch.
    pub fn calculate_discount(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        self.discount.amount_off(subtotal)
    }

    /// Whether the discount carries promotion behaviour.
    pub fn is_advanced_promotion(&self) -> bool {
        self.promotion.is_some()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        context::resolve_id,
        discounts::targeting::AppliesTo,
    };

    use super::*;

    fn definition() -> DiscountDefinition<'static> {
        DiscountDefinition::new(
            resolve_id("spring"),
            resolve_id("store"),
            "Spring10",
            SimpleDiscount::percentage_points(Decimal::from(10)),
        )
    }

    #[test]
    fn codes_match_case_insensitively() {
        let discount = definition();

        assert!(discount.matches_code("SPRING10"));
        assert!(discount.matches_code(" spring10 "));
        assert!(!discount.matches_code("SPRING20"));
    }

    #[test]
    fn inactive_discounts_are_never_valid() -> TestResult {
        let mut discount = definition();
        let now: Timestamp = "2025-06-01T12:00:00Z".parse()?;

        assert!(discount.is_valid(now));

        discount.is_active = false;

        assert!(!discount.is_valid(now));

        Ok(())
    }

    #[test]
    fn expired_discounts_are_not_valid() -> TestResult {
        let mut discount = definition();
        discount.window.expires_at = Some("2025-05-31T23:59:59Z".parse()?);

        assert!(!discount.is_valid("2025-06-01T00:00:00Z".parse()?));

        Ok(())
    }

    #[test]
    fn minimum_order_is_inclusive() {
        let mut discount = definition();
        discount.minimum_order = Some(Money::from_minor(5000, GBP));

        assert!(discount.meets_minimum_order(&Money::from_minor(5000, GBP)));
        assert!(!discount.meets_minimum_order(&Money::from_minor(4999, GBP)));
    }

    #[test]
    fn first_order_only_is_independent_of_eligibility() {
        let mut discount = definition();
        discount.first_order_only = true;

        let returning = CustomerSnapshot {
            total_orders: 2,
            ..CustomerSnapshot::default()
        };

        assert_eq!(
            discount.check_customer(Some(&returning)),
            Err(Ineligibility::FirstOrderOnly)
        );
        assert_eq!(discount.check_customer(Some(&CustomerSnapshot::default())), Ok(()));
        assert_eq!(discount.check_customer(None), Ok(()));
    }

    #[test]
    fn restricted_eligibility_rejects_guests() {
        let mut discount = definition();
        discount.eligibility =
            CustomerEligibility::SpecificCustomers([resolve_id("alice")].into_iter().collect());

        assert_eq!(discount.check_customer(None), Err(Ineligibility::NotEligible));
    }

    #[test]
    fn targeting_is_delegated() {
        let mut discount = definition();
        discount.targeting = Targeting::specific(AppliesTo::SpecificProducts, [resolve_id("mug")]);

        let mug = CartLine::new(resolve_id("mug"), 1, Money::from_minor(800, GBP));
        let tea = CartLine::new(resolve_id("tea"), 1, Money::from_minor(400, GBP));

        assert!(discount.applies_to_products(&[mug.clone(), tea.clone()]));
        assert!(!discount.applies_to_products(std::slice::from_ref(&tea)));
        assert_eq!(discount.targeted_lines(&[mug.clone(), tea]), vec![mug]);
    }

    #[test]
    fn plain_discounts_are_not_advanced() -> TestResult {
        let discount = definition();

        assert!(!discount.is_advanced_promotion());
        assert_eq!(
            discount.calculate_discount(Money::from_minor(2000, GBP))?,
            Money::from_minor(200, GBP)
        );

        Ok(())
    }
}
