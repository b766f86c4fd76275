//! In-memory Customers Repository

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::{
    RepositoryError,
    customers::{
        models::{Customer, CustomerUuid},
        repository::CustomersRepository,
    },
    stores::StoreUuid,
};

#[derive(Debug, Default)]
pub struct MemoryCustomersRepository {
    customers: RwLock<FxHashMap<(StoreUuid, CustomerUuid), Customer>>,
}

impl MemoryCustomersRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a customer, replacing any with the same UUID.
    pub async fn insert(&self, store: StoreUuid, customer: Customer) {
        self.customers
            .write()
            .await
            .insert((store, customer.uuid), customer);
    }
}

#[async_trait]
impl CustomersRepository for MemoryCustomersRepository {
    async fn get_customer(
        &self,
        store: StoreUuid,
        customer: CustomerUuid,
    ) -> Result<Customer, RepositoryError> {
        self.customers
            .read()
            .await
            .get(&(store, customer))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}
