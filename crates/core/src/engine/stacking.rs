//! Stacking
//!
//! A single greedy pass over discounts in ascending priority. The first
//! discount is always admitted; later ones only when stackable. A discount that
//! stops further rules ends the pass once admitted. Every amount is calculated
//! against the original subtotal and the lines the discount targets.

use rusty_money::{Money, iso::Currency};
use serde::Serialize;

use crate::{
    context::CartLine,
    discounts::{DiscountDefinition, DiscountId},
    engine::{PromotionEngine, PromotionObserver, SkipReason},
    promotions::PromotionDetails,
};

/// A discount admitted by the stacking pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedDiscount<'a> {
    /// Discount identifier.
    pub discount_id: DiscountId,

    /// Discount code.
    pub code: String,

    /// Amount taken off.
    #[serde(serialize_with = "serialize_minor")]
    pub amount: Money<'a, Currency>,

    /// Promotion explanation, if any.
    pub details: Option<PromotionDetails>,
}

/// Outcome of a stacking pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackingResult<'a> {
    /// Sum of admitted amounts.
    #[serde(serialize_with = "serialize_minor")]
    pub total_discount: Money<'a, Currency>,

    /// Admitted discounts, in the order they were applied.
    pub applied_discounts: Vec<AppliedDiscount<'a>>,
}

fn serialize_minor<S: serde::Serializer>(
    money: &Money<'_, Currency>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(money.to_minor_units())
}

impl<O: PromotionObserver> PromotionEngine<O> {
    /// Resolve which discounts apply together and their total.
    ///
    /// Discounts are sorted by priority, ascending; equal priorities keep their input order.
    pub fn apply_stacking_logic<'d, 'a: 'd>(
        &self,
        discounts: impl IntoIterator<Item = &'d DiscountDefinition<'a>>,
        items: &[CartLine<'a>],
        subtotal: Money<'a, Currency>,
    ) -> StackingResult<'a> {
        let mut ordered: Vec<&DiscountDefinition<'a>> = discounts.into_iter().collect();
        ordered.sort_by_key(|discount| discount.stacking.priority);

        let mut total_minor: i64 = 0;
        let mut applied_discounts: Vec<AppliedDiscount<'a>> = Vec::new();
        let mut stopped = false;

        for discount in ordered {
            if stopped {
                self.observer()
                    .on_discount_skipped(discount, SkipReason::Stopped);

                continue;
            }

            if !applied_discounts.is_empty() && !discount.stacking.is_stackable {
                self.observer()
                    .on_discount_skipped(discount, SkipReason::NotStackable);

                continue;
            }

            let targeted = discount.targeted_lines(items);
            let outcome = self.calculate_amount(discount, &targeted, subtotal);

            total_minor = total_minor.saturating_add(outcome.amount.to_minor_units());

            let applied = AppliedDiscount {
                discount_id: discount.id,
                code: discount.code.clone(),
                amount: outcome.amount,
                details: outcome.details,
            };

            self.observer().on_discount_admitted(&applied);
            applied_discounts.push(applied);

            stopped = discount.stacking.stop_further_rules;
        }

        StackingResult {
            total_discount: Money::from_minor(total_minor, subtotal.currency()),
            applied_discounts,
        }
    }
}
