//! Postgres Discounts Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rebate::discounts::DiscountRecord;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, Transaction, query, query_as, query_scalar, types::Json};
use tracing::debug;
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        RepositoryError,
        customers::CustomerUuid,
        discounts::{
            records::{DiscountUuid, NewUsageRecord, UsageRecord},
            repository::DiscountsRepository,
            rows::{DiscountRow, RuleRow},
        },
        stores::StoreUuid,
    },
};

const FIND_DISCOUNT_BY_CODE_SQL: &str = include_str!("sql/find_discount_by_code.sql");
const LIST_AUTOMATIC_DISCOUNTS_SQL: &str = include_str!("sql/list_automatic_discounts.sql");
const GET_DISCOUNT_RULES_SQL: &str = include_str!("sql/get_discount_rules.sql");
const COUNT_CUSTOMER_USAGE_SQL: &str = include_str!("sql/count_customer_usage.sql");
const CREATE_USAGE_SQL: &str = include_str!("sql/create_usage.sql");
const INCREMENT_USAGE_SQL: &str = include_str!("sql/increment_usage.sql");

#[derive(Debug, Clone)]
pub struct PgDiscountsRepository {
    db: Db,
}

impl PgDiscountsRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    async fn attach_rules(
        tx: &mut Transaction<'_, Postgres>,
        rows: Vec<DiscountRow>,
    ) -> Result<Vec<DiscountRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = rows.iter().map(|row| row.uuid).collect();

        let mut rules: FxHashMap<Uuid, Vec<_>> = FxHashMap::default();

        for row in query_as::<Postgres, RuleRow>(GET_DISCOUNT_RULES_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?
        {
            rules.entry(row.discount_uuid).or_default().push(row.rule);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut record = row.record;
                record.rules = rules.remove(&row.uuid).unwrap_or_default();
                record
            })
            .collect())
    }
}

#[async_trait]
impl DiscountsRepository for PgDiscountsRepository {
    async fn find_by_code(
        &self,
        store: StoreUuid,
        code: &str,
    ) -> Result<Option<DiscountRecord>, RepositoryError> {
        let mut tx = self.db.begin_store_transaction(store).await?;

        let row = query_as::<Postgres, DiscountRow>(FIND_DISCOUNT_BY_CODE_SQL)
            .bind(code.trim())
            .fetch_optional(&mut *tx)
            .await?;

        let record = match row {
            Some(row) => Self::attach_rules(&mut tx, vec![row]).await?.pop(),
            None => None,
        };

        tx.commit().await?;

        Ok(record)
    }

    async fn list_automatic(&self, store: StoreUuid) -> Result<Vec<DiscountRecord>, RepositoryError> {
        let mut tx = self.db.begin_store_transaction(store).await?;

        let rows = query_as::<Postgres, DiscountRow>(LIST_AUTOMATIC_DISCOUNTS_SQL)
            .fetch_all(&mut *tx)
            .await?;

        let records = Self::attach_rules(&mut tx, rows).await?;

        tx.commit().await?;

        Ok(records)
    }

    async fn count_customer_usage(
        &self,
        store: StoreUuid,
        discount: DiscountUuid,
        customer: CustomerUuid,
    ) -> Result<u32, RepositoryError> {
        let mut tx = self.db.begin_store_transaction(store).await?;

        let count: i64 = query_scalar(COUNT_CUSTOMER_USAGE_SQL)
            .bind(discount.into_uuid())
            .bind(customer.into_uuid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        u32::try_from(count).map_err(|_err| RepositoryError::OutOfRange("usage_count"))
    }

    async fn record_usage(
        &self,
        store: StoreUuid,
        usage: NewUsageRecord,
    ) -> Result<UsageRecord, RepositoryError> {
        let mut tx = self.db.begin_store_transaction(store).await?;

        let created_at: SqlxTimestamp = query_scalar(CREATE_USAGE_SQL)
            .bind(usage.uuid.into_uuid())
            .bind(store.into_uuid())
            .bind(usage.discount.into_uuid())
            .bind(usage.order.into_uuid())
            .bind(usage.customer.map(CustomerUuid::into_uuid))
            .bind(usage.discount_amount)
            .bind(usage.order_subtotal)
            .bind(&usage.currency)
            .bind(&usage.applied_product_uuids)
            .bind(Json(&usage.audit))
            .fetch_one(&mut *tx)
            .await?;

        let rows_affected = query(INCREMENT_USAGE_SQL)
            .bind(usage.discount.into_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        debug!(discount_uuid = %usage.discount, order_uuid = %usage.order, "incremented discount usage");

        Ok(usage.into_record(created_at.to_jiff()))
    }
}
