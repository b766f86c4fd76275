//! Rebate
//!
//! Rebate is a promotion and coupon rule engine. It decides which discounts
//! apply to a cart, calculates their monetary effect and resolves conflicts
//! between discounts that qualify at the same time.

pub mod context;
pub mod discounts;
pub mod engine;
pub mod fixtures;
pub mod money;
pub mod prelude;
pub mod promotions;
pub mod rules;
