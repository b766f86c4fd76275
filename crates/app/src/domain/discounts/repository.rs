//! Discounts Repository

use async_trait::async_trait;
use mockall::automock;
use rebate::discounts::DiscountRecord;

use crate::domain::{
    RepositoryError,
    customers::CustomerUuid,
    discounts::records::{DiscountUuid, NewUsageRecord, UsageRecord},
    stores::StoreUuid,
};

#[automock]
#[async_trait]
pub trait DiscountsRepository: Send + Sync {
    /// Find a store's discount by code, ignoring case.
    async fn find_by_code(
        &self,
        store: StoreUuid,
        code: &str,
    ) -> Result<Option<DiscountRecord>, RepositoryError>;

    /// Active automatic discounts for a store, with their rules.
    async fn list_automatic(&self, store: StoreUuid) -> Result<Vec<DiscountRecord>, RepositoryError>;

    /// Number of usage records a customer has against a discount.
    async fn count_customer_usage(
        &self,
        store: StoreUuid,
        discount: DiscountUuid,
        customer: CustomerUuid,
    ) -> Result<u32, RepositoryError>;

    /// Insert a usage record and increment the discount's usage count by one,
    /// atomically.
    async fn record_usage(
        &self,
        store: StoreUuid,
        usage: NewUsageRecord,
    ) -> Result<UsageRecord, RepositoryError>;
}
