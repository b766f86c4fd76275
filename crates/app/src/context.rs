//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::Db,
    domain::{
        carts::{CartsRepository, PgCartsRepository},
        coupons::{CouponsApplicationService, CouponsService},
        customers::{CustomersRepository, PgCustomersRepository},
        discounts::{DiscountsRepository, PgDiscountsRepository},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub coupons: Arc<dyn CouponsService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let db = Db::connect(url).await.map_err(AppInitError::Database)?;

        Ok(Self::from_repositories(
            Arc::new(PgDiscountsRepository::new(db.clone())),
            Arc::new(PgCartsRepository::new(db.clone())),
            Arc::new(PgCustomersRepository::new(db)),
        ))
    }

    /// Build application context over the given repositories.
    #[must_use]
    pub fn from_repositories(
        discounts: Arc<dyn DiscountsRepository>,
        carts: Arc<dyn CartsRepository>,
        customers: Arc<dyn CustomersRepository>,
    ) -> Self {
        Self {
            coupons: Arc::new(CouponsApplicationService::new(discounts, carts, customers)),
        }
    }
}
