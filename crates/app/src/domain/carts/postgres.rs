//! Postgres Carts Repository

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        RepositoryError,
        carts::{
            models::{Cart, CartItem, CartUuid},
            repository::CartsRepository,
        },
        customers::CustomerUuid,
        stores::StoreUuid,
    },
};

const GET_CART_SQL: &str = include_str!("sql/get_cart.sql");
const GET_CART_ITEMS_SQL: &str = include_str!("sql/get_cart_items.sql");
const UPDATE_DISCOUNT_CODES_SQL: &str = include_str!("sql/update_discount_codes.sql");

#[derive(Debug, Clone)]
pub struct PgCartsRepository {
    db: Db,
}

impl PgCartsRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartsRepository for PgCartsRepository {
    async fn get_cart(&self, store: StoreUuid, cart: CartUuid) -> Result<Cart, RepositoryError> {
        let mut tx = self.db.begin_store_transaction(store).await?;

        let mut found = query_as::<Postgres, Cart>(GET_CART_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut *tx)
            .await?;

        let items = query_as::<Postgres, CartItem>(GET_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        found.items.extend(items);

        Ok(found)
    }

    async fn update_discount_codes(
        &self,
        store: StoreUuid,
        cart: CartUuid,
        codes: Vec<String>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.db.begin_store_transaction(store).await?;

        let rows_affected = query(UPDATE_DISCOUNT_CODES_SQL)
            .bind(cart.into_uuid())
            .bind(codes)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for Cart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            customer: row
                .try_get::<Option<Uuid>, _>("customer_uuid")?
                .map(CustomerUuid::from_uuid),
            currency: row.try_get("currency")?,
            items: Vec::new(),
            discount_codes: row.try_get("discount_codes")?,
            shipping_country: row.try_get("shipping_country")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity: i32 = row.try_get("quantity")?;

        Ok(Self {
            product_uuid: row.try_get("product_uuid")?,
            quantity: u32::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?,
            unit_price: row.try_get("unit_price")?,
            category_uuids: row.try_get("category_uuids")?,
            brand_uuid: row.try_get("brand_uuid")?,
        })
    }
}
