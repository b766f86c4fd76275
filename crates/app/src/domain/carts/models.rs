//! Cart Models

use rebate::{
    context::{CartLine, CartSnapshot},
    money::{MoneyParseError, currency_from_code},
};
use rusty_money::{Money, iso::Currency};
use uuid::Uuid;

use crate::{domain::customers::CustomerUuid, uuids::TypedUuid};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub uuid: CartUuid,
    pub customer: Option<CustomerUuid>,
    pub currency: String,
    pub items: Vec<CartItem>,
    pub discount_codes: Vec<String>,
    pub shipping_country: Option<String>,
}

/// CartItem Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub product_uuid: Uuid,
    pub quantity: u32,
    /// Unit price in minor units
    pub unit_price: i64,
    pub category_uuids: Vec<Uuid>,
    pub brand_uuid: Option<Uuid>,
}

impl CartItem {
    pub fn line(&self, currency: &'static Currency) -> CartLine<'static> {
        let line = CartLine::new(
            self.product_uuid,
            self.quantity,
            Money::from_minor(self.unit_price, currency),
        )
        .with_categories(self.category_uuids.iter().copied());

        match self.brand_uuid {
            Some(brand) => line.with_brand(brand),
            None => line,
        }
    }
}

impl Cart {
    /// Resolve the cart currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is not supported.
    pub fn currency(&self) -> Result<&'static Currency, MoneyParseError> {
        currency_from_code(&self.currency)
    }

    /// Snapshot the cart for the promotion engine; the subtotal is the sum of
    /// line totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is not supported.
    pub fn snapshot(&self) -> Result<CartSnapshot<'static>, MoneyParseError> {
        let currency = self.currency()?;

        Ok(CartSnapshot::from_items(
            self.items.iter().map(|item| item.line(currency)).collect(),
            currency,
        ))
    }

    /// Whether `code` is applied, ignoring case.
    pub fn has_code(&self, code: &str) -> bool {
        self.discount_codes
            .iter()
            .any(|applied| applied.eq_ignore_ascii_case(code.trim()))
    }
}
