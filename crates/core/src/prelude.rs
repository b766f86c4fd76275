//! Prelude
//!
//! The types needed to build discounts, snapshot a cart and run the engine.

pub use crate::{
    context::{
        CartLine, CartSnapshot, CustomerSnapshot, DateTimeSnapshot, RuleContext, resolve_id,
    },
    discounts::{
        DiscountDefinition, DiscountKind, DiscountRecord, SimpleDiscount, StackingPolicy,
        eligibility::{CustomerEligibility, Ineligibility},
        limits::{UsageLimits, ValidityWindow},
        targeting::{AppliesTo, Targeting},
    },
    engine::{AppliedDiscount, NoopObserver, PromotionEngine, PromotionObserver, StackingResult},
    promotions::{Promotion, PromotionDetails, PromotionOutcome},
    rules::{PromotionRule, RuleMetadata},
};
