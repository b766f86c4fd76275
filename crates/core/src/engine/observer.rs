//! Engine Observer

use crate::{
    discounts::DiscountDefinition,
    engine::stacking::AppliedDiscount,
    promotions::PromotionError,
    rules::RuleDefinitionError,
};

/// Why the stacking pass skipped a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not stackable and another discount was already admitted.
    NotStackable,

    /// An earlier discount stopped further rules.
    Stopped,
}

/// Observer for the engine's decisions.
///
/// Every method has a no-op default so observers only implement what they
/// record. The engine never fails because of a misconfigured promotion or
/// rule; this is where those cases surface.
pub trait PromotionObserver: Send + Sync {
    /// A promotion contributed nothing because it could not be calculated.
    fn on_promotion_skipped(&self, _discount: &DiscountDefinition<'_>, _error: &PromotionError) {}

    /// A rule failed because its definition could not be resolved.
    fn on_unsupported_rule(
        &self,
        _discount: &DiscountDefinition<'_>,
        _error: &RuleDefinitionError,
    ) {
    }

    /// The stacking pass admitted a discount.
    fn on_discount_admitted(&self, _applied: &AppliedDiscount<'_>) {}

    /// The stacking pass skipped a discount.
    fn on_discount_skipped(&self, _discount: &DiscountDefinition<'_>, _reason: SkipReason) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PromotionObserver for NoopObserver {}
