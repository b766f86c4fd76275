//! Promotion Engine
//!
//! Stateless calculator over discount definitions and request snapshots. It
//! evaluates rule sets, calculates promotion amounts, finds automatic
//! discounts and resolves stacking between discounts that qualify together.
//!
//! Calculations never fail: a promotion that cannot be calculated contributes
//! nothing and is reported to the [`PromotionObserver`].

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    context::{CartLine, RuleContext},
    discounts::{DiscountDefinition, StoreId},
    promotions::{PromotionError, PromotionOutcome},
    rules::PromotionRule,
};

pub mod observer;
pub mod stacking;

pub use observer::{NoopObserver, PromotionObserver, SkipReason};
pub use stacking::{AppliedDiscount, StackingResult};

/// The promotion engine.
#[derive(Debug, Clone, Default)]
pub struct PromotionEngine<O: PromotionObserver = NoopObserver> {
    observer: O,
}

impl PromotionEngine {
    /// Create an engine without an observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: PromotionObserver> PromotionEngine<O> {
    /// Create an engine reporting to `observer`.
    pub fn with_observer(observer: O) -> Self {
        Self { observer }
    }

    /// Returns the observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Whether every rule on the discount passes. Unsupported rules fail and are reported.
    pub fn rules_pass(&self, discount: &DiscountDefinition<'_>, context: &RuleContext<'_>) -> bool {
        discount.rules.iter().all(|rule| {
            if let PromotionRule::Unsupported(error) = rule {
                self.observer.on_unsupported_rule(discount, error);
            }

            rule.evaluate(context)
        })
    }

    /// Calculate a discount's promotion over the supplied lines.
    ///
    /// Discounts without promotion behaviour, unrecognized or misconfigured
    /// promotions and arithmetic failures all give a zero amount without details.
    pub fn calculate_advanced_discount<'a>(
        &self,
        discount: &DiscountDefinition<'a>,
        items: &[CartLine<'a>],
        subtotal: Money<'a, Currency>,
    ) -> PromotionOutcome<'a> {
        let Some(promotion) = &discount.promotion else {
            return PromotionOutcome::nothing(subtotal.currency());
        };

        promotion
            .calculate(&discount.discount, items, subtotal)
            .unwrap_or_else(|error| self.skipped(discount, &error, subtotal.currency()))
    }

    /// Calculate a discount's amount: its promotion when it has one, otherwise
    /// its plain value against the subtotal.
    pub fn calculate_amount<'a>(
        &self,
        discount: &DiscountDefinition<'a>,
        items: &[CartLine<'a>],
        subtotal: Money<'a, Currency>,
    ) -> PromotionOutcome<'a> {
        if discount.is_advanced_promotion() {
            return self.calculate_advanced_discount(discount, items, subtotal);
        }

        match discount.calculate_discount(subtotal) {
            Ok(amount) => PromotionOutcome {
                amount,
                details: None,
            },
            Err(error) => self.skipped(discount, &PromotionError::from(error), subtotal.currency()),
        }
    }

    /// Automatic discounts for a store whose rules pass.
    ///
    /// Candidates must belong to the store, be active, automatic and within
    /// their validity window at `now`. Customer eligibility is not checked here.
    pub fn find_automatic_discounts<'d, 'a>(
        &self,
        store: StoreId,
        candidates: &'d [DiscountDefinition<'a>],
        context: &RuleContext<'_>,
        now: Timestamp,
    ) -> Vec<&'d DiscountDefinition<'a>> {
        candidates
            .iter()
            .filter(|discount| discount.store_id == store)
            .filter(|discount| discount.is_automatic && discount.is_valid(now))
            .filter(|discount| self.rules_pass(discount, context))
            .collect()
    }

    fn skipped<'a>(
        &self,
        discount: &DiscountDefinition<'a>,
        error: &PromotionError,
        currency: &'a Currency,
    ) -> PromotionOutcome<'a> {
        self.observer.on_promotion_skipped(discount, error);

        PromotionOutcome::nothing(currency)
    }
}
