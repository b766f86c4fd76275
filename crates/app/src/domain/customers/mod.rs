//! Customers

mod memory;
pub mod models;
mod postgres;
mod repository;

pub use memory::MemoryCustomersRepository;
pub use models::{Customer, CustomerUuid};
pub use postgres::PgCustomersRepository;
pub use repository::*;
