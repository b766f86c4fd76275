//! Carts Repository

use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    RepositoryError,
    carts::models::{Cart, CartUuid},
    stores::StoreUuid,
};

#[automock]
#[async_trait]
pub trait CartsRepository: Send + Sync {
    /// Retrieve a cart with its items and applied codes.
    async fn get_cart(&self, store: StoreUuid, cart: CartUuid) -> Result<Cart, RepositoryError>;

    /// Replace the codes applied to a cart.
    async fn update_discount_codes(
        &self,
        store: StoreUuid,
        cart: CartUuid,
        codes: Vec<String>,
    ) -> Result<(), RepositoryError>;
}
