//! Fixtures
//!
//! YAML descriptions of a store's discounts, carts and customers, used by the
//! offline quote command and the integration tests.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rusty_money::iso::Currency;
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    context::resolve_id,
    discounts::{DiscountDefinition, DiscountRecord, RecordError, StoreId},
    money::{MoneyParseError, currency_from_code},
};

pub mod carts;

pub use carts::{CartFixture, CartLineFixture, CustomerFixture};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency or unrepresentable amount
    #[error(transparent)]
    Money(#[from] MoneyParseError),

    /// A discount could not be resolved
    #[error(transparent)]
    Discount(#[from] RecordError),
}

/// Discounts for one store
#[derive(Debug, Deserialize)]
pub struct DiscountsFixture {
    /// Store key or UUID
    pub store: String,

    /// ISO currency code for amounts in the fixture
    pub currency: String,

    /// Discount records
    pub discounts: Vec<DiscountRecord>,
}

impl DiscountsFixture {
    /// Returns the store identifier.
    pub fn store_id(&self) -> StoreId {
        resolve_id(&self.store)
    }

    /// Returns the fixture currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is not supported.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        Ok(currency_from_code(&self.currency)?)
    }

    /// Resolve every record into a discount definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is unsupported or a record is invalid.
    pub fn into_definitions(self) -> Result<Vec<DiscountDefinition<'static>>, FixtureError> {
        let store = self.store_id();
        let currency = self.currency()?;

        self.discounts
            .into_iter()
            .map(|record| {
                record
                    .into_definition(store, currency)
                    .map_err(FixtureError::from)
            })
            .collect()
    }
}

/// Parse a YAML document.
///
/// # Errors
///
/// Returns an error if the YAML does not describe a `T`.
pub fn from_yaml<T: DeserializeOwned>(contents: &str) -> Result<T, FixtureError> {
    Ok(serde_norway::from_str(contents)?)
}

/// Read and parse a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, FixtureError> {
    from_yaml(&fs::read_to_string(path)?)
}

/// Fixture directory
#[derive(Debug, Clone)]
pub struct Fixture {
    base_path: PathBuf,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Use the default `./fixtures` directory
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Use a custom fixture directory
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Load `discounts/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn discounts(&self, name: &str) -> Result<DiscountsFixture, FixtureError> {
        load(self.path("discounts", name))
    }

    /// Load `carts/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn cart(&self, name: &str) -> Result<CartFixture, FixtureError> {
        load(self.path("carts", name))
    }

    /// Load `customers/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn customer(&self, name: &str) -> Result<CustomerFixture, FixtureError> {
        load(self.path("customers", name))
    }

    fn path(&self, kind: &str, name: &str) -> PathBuf {
        self.base_path.join(kind).join(format!("{name}.yml"))
    }
}
