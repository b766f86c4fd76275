//! Engine events as tracing events

use rebate::{
    discounts::DiscountDefinition,
    engine::{AppliedDiscount, PromotionObserver, SkipReason},
    promotions::PromotionError,
    rules::RuleDefinitionError,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PromotionObserver for TracingObserver {
    fn on_promotion_skipped(&self, discount: &DiscountDefinition<'_>, error: &PromotionError) {
        warn!(
            discount_uuid = %discount.id,
            discount_code = %discount.code,
            %error,
            "promotion contributed nothing"
        );
    }

    fn on_unsupported_rule(&self, discount: &DiscountDefinition<'_>, error: &RuleDefinitionError) {
        warn!(
            discount_uuid = %discount.id,
            discount_code = %discount.code,
            %error,
            "rule cannot be evaluated"
        );
    }

    fn on_discount_admitted(&self, applied: &AppliedDiscount<'_>) {
        debug!(
            discount_uuid = %applied.discount_id,
            discount_code = %applied.code,
            amount = applied.amount.to_minor_units(),
            "admitted discount"
        );
    }

    fn on_discount_skipped(&self, discount: &DiscountDefinition<'_>, reason: SkipReason) {
        debug!(
            discount_uuid = %discount.id,
            discount_code = %discount.code,
            ?reason,
            "skipped discount"
        );
    }
}
