//! Carts

mod memory;
pub mod models;
mod postgres;
mod repository;

pub use memory::MemoryCartsRepository;
pub use models::{Cart, CartItem, CartUuid};
pub use postgres::PgCartsRepository;
pub use repository::*;
