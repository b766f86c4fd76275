//! Postgres Customers Repository

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        RepositoryError,
        customers::{
            models::{Customer, CustomerUuid},
            repository::CustomersRepository,
        },
        stores::StoreUuid,
    },
};

const GET_CUSTOMER_SQL: &str = include_str!("sql/get_customer.sql");

#[derive(Debug, Clone)]
pub struct PgCustomersRepository {
    db: Db,
}

impl PgCustomersRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomersRepository for PgCustomersRepository {
    async fn get_customer(
        &self,
        store: StoreUuid,
        customer: CustomerUuid,
    ) -> Result<Customer, RepositoryError> {
        let mut tx = self.db.begin_store_transaction(store).await?;

        let customer = query_as::<Postgres, Customer>(GET_CUSTOMER_SQL)
            .bind(customer.into_uuid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(customer)
    }
}

impl<'r> FromRow<'r, PgRow> for Customer {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let total_orders: i32 = row.try_get("total_orders")?;

        Ok(Self {
            uuid: CustomerUuid::from_uuid(row.try_get("uuid")?),
            group_uuids: row.try_get::<Vec<Uuid>, _>("group_uuids")?,
            total_orders: u32::try_from(total_orders).map_err(|e| sqlx::Error::ColumnDecode {
                index: "total_orders".to_string(),
                source: Box::new(e),
            })?,
        })
    }
}
