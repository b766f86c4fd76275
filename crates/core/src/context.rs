//! Request Context
//!
//! Read-only snapshots of the cart, customer, shipping destination and clock
//! that rules and promotions are evaluated against. The engine never mutates
//! them.

use jiff::{Timestamp, civil::Weekday, tz::TimeZone};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use uuid::Uuid;

/// Product identifier.
pub type ProductId = Uuid;

/// Category identifier.
pub type CategoryId = Uuid;

/// Brand identifier.
pub type BrandId = Uuid;

/// Customer identifier.
pub type CustomerId = Uuid;

/// Customer group identifier.
pub type CustomerGroupId = Uuid;

/// Parse an identifier from configuration.
///
/// Accepts a UUID literal, or derives a stable name-based UUID from a readable
/// key (e.g. `"t-shirt"`), so fixtures and stored configuration agree on ids.
#[must_use]
pub fn resolve_id(key: &str) -> Uuid {
    let key = key.trim();

    Uuid::parse_str(key).unwrap_or_else(|_err| Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
}

/// A priced cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    product: ProductId,
    quantity: u32,
    price: Money<'a, Currency>,
    categories: SmallVec<[CategoryId; 2]>,
    brand: Option<BrandId>,
}

impl<'a> CartLine<'a> {
    /// Create a line for `quantity` units of a product at a unit price.
    #[must_use]
    pub fn new(product: ProductId, quantity: u32, price: Money<'a, Currency>) -> Self {
        Self {
            product,
            quantity,
            price,
            categories: SmallVec::new(),
            brand: None,
        }
    }

    /// Attach the product's categories.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Attach the product's brand.
    #[must_use]
    pub fn with_brand(mut self, brand: BrandId) -> Self {
        self.brand = Some(brand);
        self
    }

    /// Returns the product on this line.
    pub fn product(&self) -> ProductId {
        self.product
    }

    /// Returns the number of units.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the unit price.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Returns the product's categories.
    pub fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    /// Returns the product's brand, if known.
    pub fn brand(&self) -> Option<BrandId> {
        self.brand
    }

    /// Whether the product belongs to `category`.
    pub fn in_category(&self, category: CategoryId) -> bool {
        self.categories.contains(&category)
    }

    /// Line total (unit price × quantity) in minor units.
    pub fn total_minor(&self) -> i64 {
        self.price
            .to_minor_units()
            .saturating_mul(i64::from(self.quantity))
    }
}

/// Cart snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot<'a> {
    subtotal: Money<'a, Currency>,
    items: Vec<CartLine<'a>>,
}

impl<'a> CartSnapshot<'a> {
    /// Create a snapshot from a subtotal supplied by the cart provider.
    #[must_use]
    pub fn new(subtotal: Money<'a, Currency>, items: Vec<CartLine<'a>>) -> Self {
        Self { subtotal, items }
    }

    /// Create a snapshot whose subtotal is the sum of its line totals.
    #[must_use]
    pub fn from_items(items: Vec<CartLine<'a>>, currency: &'a Currency) -> Self {
        let subtotal = items
            .iter()
            .map(CartLine::total_minor)
            .fold(0_i64, i64::saturating_add);

        Self {
            subtotal: Money::from_minor(subtotal, currency),
            items,
        }
    }

    /// Returns the cart subtotal.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Returns the cart lines.
    pub fn items(&self) -> &[CartLine<'a>] {
        &self.items
    }

    /// Total units across all lines.
    pub fn quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity()))
            .sum()
    }
}

/// Customer snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerSnapshot {
    /// Customer identifier.
    pub id: CustomerId,

    /// Groups the customer belongs to.
    pub groups: SmallVec<[CustomerGroupId; 4]>,

    /// Number of completed orders.
    pub total_orders: u32,
}

impl CustomerSnapshot {
    /// Whether the customer has never completed an order.
    pub fn is_new(&self) -> bool {
        self.total_orders == 0
    }
}

/// Shipping destination snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingSnapshot {
    /// Destination country, as supplied by the shipping provider (e.g. `"US"`).
    pub country: String,
}

/// Local date and time at which the request is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeSnapshot {
    /// Day of the week.
    pub day_of_week: Weekday,

    /// Hour of the day, 0-23.
    pub hour: i8,
}

impl DateTimeSnapshot {
    /// Take the snapshot for an instant in a time zone.
    #[must_use]
    pub fn at(instant: Timestamp, time_zone: &TimeZone) -> Self {
        let zoned = instant.to_zoned(time_zone.clone());

        Self {
            day_of_week: zoned.weekday(),
            hour: zoned.hour(),
        }
    }
}

/// Everything a rule may read.
///
/// Any part can be absent; rules that need a missing part fail closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleContext<'a> {
    /// Cart contents.
    pub cart: Option<CartSnapshot<'a>>,

    /// The customer placing the order.
    pub customer: Option<CustomerSnapshot>,

    /// Shipping destination.
    pub shipping: Option<ShippingSnapshot>,

    /// Evaluation date and time.
    pub datetime: Option<DateTimeSnapshot>,
}

impl<'a> RuleContext<'a> {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cart snapshot.
    #[must_use]
    pub fn with_cart(mut self, cart: CartSnapshot<'a>) -> Self {
        self.cart = Some(cart);
        self
    }

    /// Set the customer snapshot.
    #[must_use]
    pub fn with_customer(mut self, customer: CustomerSnapshot) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Set the shipping destination.
    #[must_use]
    pub fn with_shipping_country(mut self, country: impl Into<String>) -> Self {
        self.shipping = Some(ShippingSnapshot {
            country: country.into(),
        });
        self
    }

    /// Set the evaluation date and time.
    #[must_use]
    pub fn with_datetime(mut self, datetime: DateTimeSnapshot) -> Self {
        self.datetime = Some(datetime);
        self
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn resolve_id_accepts_uuid_literals() -> TestResult {
        let uuid = Uuid::parse_str("0191e7a4-7b0c-7a51-9d3e-1c2b3a4d5e6f")?;

        assert_eq!(resolve_id("0191e7a4-7b0c-7a51-9d3e-1c2b3a4d5e6f"), uuid);

        Ok(())
    }

    #[test]
    fn resolve_id_is_stable_for_keys() {
        assert_eq!(resolve_id("t-shirt"), resolve_id(" t-shirt "));
        assert_ne!(resolve_id("t-shirt"), resolve_id("cap"));
    }

    #[test]
    fn snapshot_subtotal_sums_line_totals() {
        let cart = CartSnapshot::from_items(
            vec![
                CartLine::new(resolve_id("tea"), 3, Money::from_minor(250, GBP)),
                CartLine::new(resolve_id("cake"), 1, Money::from_minor(399, GBP)),
            ],
            GBP,
        );

        assert_eq!(cart.subtotal(), Money::from_minor(1149, GBP));
        assert_eq!(cart.quantity(), 4);
    }

    #[test]
    fn datetime_snapshot_uses_time_zone() -> TestResult {
        // 2025-06-01 is a Sunday.
        let instant: Timestamp = "2025-06-01T23:30:00Z".parse()?;

        let utc = DateTimeSnapshot::at(instant, &TimeZone::UTC);
        let ahead = DateTimeSnapshot::at(instant, &TimeZone::fixed(jiff::tz::offset(2)));

        assert_eq!(utc.day_of_week, Weekday::Sunday);
        assert_eq!(utc.hour, 23);
        assert_eq!(ahead.day_of_week, Weekday::Monday);
        assert_eq!(ahead.hour, 1);

        Ok(())
    }
}
