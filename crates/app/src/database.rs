//! Database connection management
//!
//! Every store-scoped query runs inside a transaction that first sets
//! [`STORE_SETTING`]; the row-level security policies created by the
//! migrations compare each row's `store_uuid` against it.

use sqlx::{PgPool, Postgres, Transaction, migrate::MigrateError, query};

use crate::domain::stores::StoreUuid;

/// Session setting read by the store isolation policies.
pub const STORE_SETTING: &str = "app.current_store_uuid";

/// Sets [`STORE_SETTING`] for the current transaction only.
pub const SET_STORE_CONTEXT_SQL: &str = "SELECT set_config('app.current_store_uuid', $1, true)";

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        PgPool::connect(database_url).await.map(Self::new)
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails or the applied history has diverged.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Begin a transaction scoped to one store.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or setting the store fails.
    pub async fn begin_store_transaction(
        &self,
        store: StoreUuid,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_STORE_CONTEXT_SQL)
            .bind(store.to_string())
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE_RLS_MIGRATION: &str =
        include_str!("../migrations/20250301000200_enable_store_rls.sql");

    #[test]
    fn store_context_sets_the_setting_the_policies_read() {
        assert!(SET_STORE_CONTEXT_SQL.contains(&format!("'{STORE_SETTING}'")));
        assert!(
            STORE_RLS_MIGRATION.contains(&format!("current_setting(''{STORE_SETTING}'', true)")),
            "store isolation policies should read {STORE_SETTING}"
        );
    }

    #[test]
    fn store_context_is_transaction_local() {
        assert!(SET_STORE_CONTEXT_SQL.trim_end().ends_with("$1, true)"));
    }
}
