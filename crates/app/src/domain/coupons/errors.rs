//! Coupons service errors.

use rebate::{discounts::RecordError, money::MoneyParseError};
use thiserror::Error;

use crate::domain::RepositoryError;

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("discount {0:?} not found")]
    DiscountNotFound(String),

    #[error("cart not found")]
    CartNotFound,

    #[error("customer not found")]
    CustomerNotFound,

    #[error("stored discount is invalid")]
    InvalidDiscount(#[from] RecordError),

    #[error("unsupported currency")]
    Currency(#[from] MoneyParseError),

    #[error("storage error")]
    Storage(#[from] RepositoryError),
}
