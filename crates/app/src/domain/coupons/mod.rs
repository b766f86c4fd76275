//! Coupons
//!
//! Applying codes to carts, discovering automatic discounts, quoting carts and
//! recording usage when orders complete.

mod errors;
pub mod models;
mod observer;
pub mod service;

pub use errors::CouponsServiceError;
pub use models::{CartQuote, CouponOutcome, CouponRejection, OrderUsage};
pub use observer::TracingObserver;
pub use service::*;
