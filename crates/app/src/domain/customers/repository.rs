//! Customers Repository

use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    RepositoryError,
    customers::models::{Customer, CustomerUuid},
    stores::StoreUuid,
};

#[automock]
#[async_trait]
pub trait CustomersRepository: Send + Sync {
    /// Retrieve a customer with their group memberships and order count.
    async fn get_customer(
        &self,
        store: StoreUuid,
        customer: CustomerUuid,
    ) -> Result<Customer, RepositoryError>;
}
