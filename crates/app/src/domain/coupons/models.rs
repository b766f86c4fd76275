//! Coupon Models

use std::fmt::{Display, Formatter, Result as FmtResult};

use rebate::engine::StackingResult;
use rusty_money::{Money, iso::Currency};
use uuid::Uuid;

use crate::domain::{
    carts::{CartItem, CartUuid},
    customers::CustomerUuid,
    discounts::{OrderUuid, UsageAudit},
};

/// Why a code cannot be applied to, or removed from, a cart.
///
/// These are expected, user-facing outcomes rather than errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    NotFound,
    NoLongerValid,
    UsageLimitReached,
    MinimumOrder { minimum: String },
    NotEligible,
    FirstOrderOnly,
    CustomerLimitReached,
    NoEligibleItems,
    AlreadyApplied,
    CannotCombine,
    NotApplied,
}

impl Display for CouponRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotFound => f.write_str("Discount code not found"),
            Self::NoLongerValid => f.write_str("This discount code is no longer valid"),
            Self::UsageLimitReached => f.write_str("This discount code has reached its usage limit"),
            Self::MinimumOrder { minimum } => {
                write!(f, "A minimum order of {minimum} is required for this discount")
            }
            Self::NotEligible => f.write_str("You are not eligible for this discount"),
            Self::FirstOrderOnly => {
                f.write_str("This discount is only available on your first order")
            }
            Self::CustomerLimitReached => {
                f.write_str("You have already used this discount the maximum number of times")
            }
            Self::NoEligibleItems => {
                f.write_str("This discount does not apply to any items in your cart")
            }
            Self::AlreadyApplied => f.write_str("This discount code has already been applied"),
            Self::CannotCombine => f.write_str("This discount cannot be combined with other discounts"),
            Self::NotApplied => f.write_str("This discount code is not applied to your cart"),
        }
    }
}

/// A coupon operation's result: accepted with a value, or rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum CouponOutcome<T> {
    Accepted(T),
    Rejected(CouponRejection),
}

impl<T> CouponOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&CouponRejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// The user-facing message for a rejection.
    pub fn message(&self) -> Option<String> {
        self.rejection().map(ToString::to_string)
    }
}

/// A completed order's discount usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUsage {
    pub order: OrderUuid,
    pub customer: Option<CustomerUuid>,
    pub codes: Vec<String>,
    pub currency: String,
    /// Order subtotal, in minor units
    pub order_subtotal: i64,
    pub items: Vec<CartItem>,
    pub audit: UsageAudit,
}

/// The discounts a cart qualifies for.
///
/// Only discounts worth something are stacked. Free gifts are listed
/// separately and never take part in stacking.
#[derive(Debug, Clone)]
pub struct CartQuote {
    pub cart: CartUuid,
    pub subtotal: Money<'static, Currency>,
    pub stacking: StackingResult<'static>,
    /// Products to add to the cart at no charge
    pub free_gift_product_uuids: Vec<Uuid>,
}

impl CartQuote {
    pub(crate) fn new(
        cart: CartUuid,
        subtotal: Money<'static, Currency>,
        stacking: StackingResult<'static>,
        free_gift_product_uuids: Vec<Uuid>,
    ) -> Self {
        Self {
            cart,
            subtotal,
            stacking,
            free_gift_product_uuids,
        }
    }

    /// Subtotal after the stacked discounts, never below zero.
    pub fn total(&self) -> Money<'static, Currency> {
        let total = self
            .subtotal
            .to_minor_units()
            .saturating_sub(self.stacking.total_discount.to_minor_units())
            .max(0);

        Money::from_minor(total, self.subtotal.currency())
    }
}
