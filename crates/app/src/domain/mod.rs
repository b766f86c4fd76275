//! Rebate Domain Concerns

pub mod carts;
pub mod coupons;
pub mod customers;
pub mod discounts;
pub mod errors;
pub mod stores;

pub use errors::RepositoryError;
