//! Cart and Customer Fixtures

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    context::{CartLine, CartSnapshot, CustomerSnapshot, resolve_id},
    fixtures::FixtureError,
    money::{currency_from_code, money_from_major},
};

/// Cart line fixture
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineFixture {
    /// Product key or UUID
    pub product: String,

    /// Units
    pub quantity: u32,

    /// Unit price in major units
    pub price: Decimal,

    /// Category keys or UUIDs
    #[serde(default)]
    pub categories: Vec<String>,

    /// Brand key or UUID
    #[serde(default)]
    pub brand: Option<String>,
}

/// Cart fixture
#[derive(Debug, Clone, Deserialize)]
pub struct CartFixture {
    /// ISO currency code
    pub currency: String,

    /// Cart lines
    pub items: Vec<CartLineFixture>,

    /// Subtotal supplied by the cart provider; the sum of line totals when absent
    #[serde(default)]
    pub subtotal: Option<Decimal>,

    /// Codes already applied to the cart
    #[serde(default)]
    pub discount_codes: Vec<String>,

    /// Shipping destination country
    #[serde(default)]
    pub shipping_country: Option<String>,
}

impl CartFixture {
    /// Returns the cart currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is not supported.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        Ok(currency_from_code(&self.currency)?)
    }

    /// Build the cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported currencies or unrepresentable prices.
    pub fn lines(&self) -> Result<Vec<CartLine<'static>>, FixtureError> {
        let currency = self.currency()?;

        self.items
            .iter()
            .map(|item| -> Result<CartLine<'static>, FixtureError> {
                let line = CartLine::new(
                    resolve_id(&item.product),
                    item.quantity,
                    money_from_major(item.price, currency)?,
                )
                .with_categories(item.categories.iter().map(|category| resolve_id(category)));

                Ok(match &item.brand {
                    Some(brand) => line.with_brand(resolve_id(brand)),
                    None => line,
                })
            })
            .collect()
    }

    /// Returns the subtotal: the supplied one, or the sum of line totals.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported currencies or unrepresentable amounts.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, FixtureError> {
        Ok(self.snapshot()?.subtotal())
    }

    /// Build a cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported currencies or unrepresentable amounts.
    pub fn snapshot(&self) -> Result<CartSnapshot<'static>, FixtureError> {
        let currency = self.currency()?;
        let lines = self.lines()?;

        Ok(match self.subtotal {
            Some(subtotal) => CartSnapshot::new(money_from_major(subtotal, currency)?, lines),
            None => CartSnapshot::from_items(lines, currency),
        })
    }
}

/// Customer fixture
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerFixture {
    /// Customer key or UUID
    pub id: String,

    /// Group keys or UUIDs
    #[serde(default)]
    pub groups: Vec<String>,

    /// Completed orders
    #[serde(default)]
    pub total_orders: u32,
}

impl CustomerFixture {
    /// Build a customer snapshot.
    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            id: resolve_id(&self.id),
            groups: self
                .groups
                .iter()
                .map(|group| resolve_id(group))
                .collect::<SmallVec<_>>(),
            total_orders: self.total_orders,
        }
    }
}
