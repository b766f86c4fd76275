//! In-memory Carts Repository

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::{
    RepositoryError,
    carts::{
        models::{Cart, CartUuid},
        repository::CartsRepository,
    },
    stores::StoreUuid,
};

#[derive(Debug, Default)]
pub struct MemoryCartsRepository {
    carts: RwLock<FxHashMap<(StoreUuid, CartUuid), Cart>>,
}

impl MemoryCartsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cart, replacing any with the same UUID.
    pub async fn insert(&self, store: StoreUuid, cart: Cart) {
        self.carts.write().await.insert((store, cart.uuid), cart);
    }
}

#[async_trait]
impl CartsRepository for MemoryCartsRepository {
    async fn get_cart(&self, store: StoreUuid, cart: CartUuid) -> Result<Cart, RepositoryError> {
        self.carts
            .read()
            .await
            .get(&(store, cart))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_discount_codes(
        &self,
        store: StoreUuid,
        cart: CartUuid,
        codes: Vec<String>,
    ) -> Result<(), RepositoryError> {
        let mut carts = self.carts.write().await;
        let found = carts
            .get_mut(&(store, cart))
            .ok_or(RepositoryError::NotFound)?;

        found.discount_codes = codes;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn updating_codes_on_a_missing_cart_is_not_found() {
        let repository = MemoryCartsRepository::new();

        let result = repository
            .update_discount_codes(StoreUuid::now_v7(), CartUuid::now_v7(), vec!["X".to_string()])
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn updated_codes_are_returned_by_get_cart() -> TestResult {
        let repository = MemoryCartsRepository::new();
        let store = StoreUuid::now_v7();
        let cart = Cart {
            uuid: CartUuid::now_v7(),
            customer: None,
            currency: "USD".to_string(),
            items: Vec::new(),
            discount_codes: Vec::new(),
            shipping_country: None,
        };

        repository.insert(store, cart.clone()).await;
        repository
            .update_discount_codes(store, cart.uuid, vec!["TEN".to_string()])
            .await?;

        assert_eq!(repository.get_cart(store, cart.uuid).await?.discount_codes, vec!["TEN"]);

        Ok(())
    }
}
