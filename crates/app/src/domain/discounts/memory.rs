//! In-memory Discounts Repository

use async_trait::async_trait;
use jiff::Timestamp;
use rebate::discounts::DiscountRecord;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::{
    RepositoryError,
    customers::CustomerUuid,
    discounts::{
        records::{DiscountUuid, NewUsageRecord, UsageRecord},
        repository::DiscountsRepository,
    },
    stores::StoreUuid,
};

#[derive(Debug, Default)]
struct Discounts {
    records: FxHashMap<StoreUuid, Vec<DiscountRecord>>,
    usages: Vec<(StoreUuid, UsageRecord)>,
}

#[derive(Debug, Default)]
pub struct MemoryDiscountsRepository {
    state: RwLock<Discounts>,
}

impl MemoryDiscountsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a discount, replacing any with the same identifier.
    pub async fn insert(&self, store: StoreUuid, record: DiscountRecord) {
        let mut state = self.state.write().await;
        let records = state.records.entry(store).or_default();

        records.retain(|existing| existing.discount_id() != record.discount_id());
        records.push(record);
    }

    /// Usage recorded for a store, oldest first.
    pub async fn usages(&self, store: StoreUuid) -> Vec<UsageRecord> {
        self.state
            .read()
            .await
            .usages
            .iter()
            .filter(|(usage_store, _)| *usage_store == store)
            .map(|(_, usage)| usage.clone())
            .collect()
    }
}

#[async_trait]
impl DiscountsRepository for MemoryDiscountsRepository {
    async fn find_by_code(
        &self,
        store: StoreUuid,
        code: &str,
    ) -> Result<Option<DiscountRecord>, RepositoryError> {
        let code = code.trim();

        Ok(self
            .state
            .read()
            .await
            .records
            .get(&store)
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| record.code.eq_ignore_ascii_case(code))
            })
            .cloned())
    }

    async fn list_automatic(&self, store: StoreUuid) -> Result<Vec<DiscountRecord>, RepositoryError> {
        let mut automatic: Vec<DiscountRecord> = self
            .state
            .read()
            .await
            .records
            .get(&store)
            .into_iter()
            .flatten()
            .filter(|record| record.is_automatic && record.is_active)
            .cloned()
            .collect();

        automatic.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.code.cmp(&b.code)));

        Ok(automatic)
    }

    async fn count_customer_usage(
        &self,
        store: StoreUuid,
        discount: DiscountUuid,
        customer: CustomerUuid,
    ) -> Result<u32, RepositoryError> {
        let count = self
            .state
            .read()
            .await
            .usages
            .iter()
            .filter(|(usage_store, usage)| {
                *usage_store == store
                    && usage.discount == discount
                    && usage.customer == Some(customer)
            })
            .count();

        u32::try_from(count).map_err(|_err| RepositoryError::OutOfRange("usage_count"))
    }

    async fn record_usage(
        &self,
        store: StoreUuid,
        usage: NewUsageRecord,
    ) -> Result<UsageRecord, RepositoryError> {
        let mut state = self.state.write().await;

        let record = state
            .records
            .get_mut(&store)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|record| record.discount_id() == usage.discount.into_uuid())
            })
            .ok_or(RepositoryError::NotFound)?;

        record.current_usage = record
            .current_usage
            .checked_add(1)
            .ok_or(RepositoryError::OutOfRange("current_usage"))?;

        let usage = usage.into_record(Timestamp::now());

        state.usages.push((store, usage.clone()));

        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use rebate::discounts::DiscountKind;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::domain::discounts::records::{OrderUuid, UsageAudit, UsageUuid};

    use super::*;

    fn usage(discount: DiscountUuid, customer: Option<CustomerUuid>) -> NewUsageRecord {
        NewUsageRecord {
            uuid: UsageUuid::now_v7(),
            discount,
            order: OrderUuid::now_v7(),
            customer,
            discount_amount: 500,
            order_subtotal: 4_000,
            currency: "GBP".to_string(),
            applied_product_uuids: Vec::new(),
            audit: UsageAudit::default(),
        }
    }

    #[tokio::test]
    async fn find_by_code_ignores_case() -> TestResult {
        let repository = MemoryDiscountsRepository::new();
        let store = StoreUuid::now_v7();

        repository
            .insert(store, DiscountRecord::new("Summer20", DiscountKind::Percentage, Decimal::from(20)))
            .await;

        let found = repository.find_by_code(store, " SUMMER20 ").await?;

        assert_eq!(found.map(|record| record.code), Some("Summer20".to_string()));
        assert!(repository.find_by_code(StoreUuid::now_v7(), "SUMMER20").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn list_automatic_skips_manual_and_inactive() -> TestResult {
        let repository = MemoryDiscountsRepository::new();
        let store = StoreUuid::now_v7();

        let mut automatic = DiscountRecord::new("AUTO", DiscountKind::Fixed, Decimal::ONE);
        automatic.is_automatic = true;

        let mut inactive = automatic.clone();
        inactive.code = "OFF".to_string();
        inactive.is_active = false;

        repository.insert(store, automatic).await;
        repository.insert(store, inactive).await;
        repository
            .insert(store, DiscountRecord::new("MANUAL", DiscountKind::Fixed, Decimal::ONE))
            .await;

        let codes: Vec<String> = repository
            .list_automatic(store)
            .await?
            .into_iter()
            .map(|record| record.code)
            .collect();

        assert_eq!(codes, vec!["AUTO"]);

        Ok(())
    }

    #[tokio::test]
    async fn recording_usage_increments_the_discount_and_counts_per_customer() -> TestResult {
        let repository = MemoryDiscountsRepository::new();
        let store = StoreUuid::now_v7();
        let record = DiscountRecord::new("FIVE", DiscountKind::Fixed, Decimal::from(5));
        let discount = DiscountUuid::from_uuid(record.discount_id());
        let customer = CustomerUuid::now_v7();

        repository.insert(store, record).await;
        repository.record_usage(store, usage(discount, Some(customer))).await?;
        repository.record_usage(store, usage(discount, None)).await?;

        let stored = repository.find_by_code(store, "FIVE").await?.ok_or("FIVE missing")?;

        assert_eq!(stored.current_usage, 2);
        assert_eq!(repository.count_customer_usage(store, discount, customer).await?, 1);
        assert_eq!(repository.usages(store).await.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn recording_usage_for_an_unknown_discount_is_not_found() {
        let repository = MemoryDiscountsRepository::new();

        let result = repository
            .record_usage(StoreUuid::now_v7(), usage(DiscountUuid::now_v7(), None))
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
