//! Discounts
//!
//! Stored discount definitions, their promotion rules and the usage recorded
//! against them when orders complete.

mod memory;
mod postgres;
pub mod records;
mod repository;
mod rows;

pub use memory::MemoryDiscountsRepository;
pub use postgres::PgDiscountsRepository;
pub use records::{DiscountUuid, NewUsageRecord, OrderUuid, UsageAudit, UsageRecord, UsageUuid};
pub use repository::*;
