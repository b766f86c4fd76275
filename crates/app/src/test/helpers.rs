//! Test Helpers

use jiff::Timestamp;
use rebate::{
    context::resolve_id,
    discounts::{DiscountKind, DiscountRecord},
};
use rust_decimal::Decimal;

use crate::{
    domain::{
        carts::{Cart, CartItem, CartUuid},
        customers::{Customer, CustomerUuid},
    },
    test::TestContext,
};

/// 2025-03-01 was a Saturday.
pub(crate) fn now() -> Timestamp {
    Timestamp::from_second(1_740_823_200).unwrap_or(Timestamp::UNIX_EPOCH)
}

pub(crate) fn item(product: &str, quantity: u32, unit_price: i64) -> CartItem {
    CartItem {
        product_uuid: resolve_id(product),
        quantity,
        unit_price,
        category_uuids: Vec::new(),
        brand_uuid: None,
    }
}

pub(crate) fn fixed(code: &str, value: i64) -> DiscountRecord {
    DiscountRecord::new(code, DiscountKind::Fixed, Decimal::from(value))
}

pub(crate) fn percentage(code: &str, value: i64) -> DiscountRecord {
    DiscountRecord::new(code, DiscountKind::Percentage, Decimal::from(value))
}

pub(crate) async fn add_discount(ctx: &TestContext, record: DiscountRecord) {
    ctx.discounts.insert(ctx.store, record).await;
}

pub(crate) async fn create_cart(
    ctx: &TestContext,
    customer: Option<CustomerUuid>,
    items: Vec<CartItem>,
) -> CartUuid {
    let cart = Cart {
        uuid: CartUuid::now_v7(),
        customer,
        currency: "GBP".to_string(),
        items,
        discount_codes: Vec::new(),
        shipping_country: Some("GB".to_string()),
    };

    let uuid = cart.uuid;

    ctx.carts.insert(ctx.store, cart).await;

    uuid
}

pub(crate) async fn create_customer(ctx: &TestContext, total_orders: u32, groups: &[&str]) -> CustomerUuid {
    let customer = Customer {
        uuid: CustomerUuid::now_v7(),
        group_uuids: groups.iter().map(|group| resolve_id(group)).collect(),
        total_orders,
    };

    let uuid = customer.uuid;

    ctx.customers.insert(ctx.store, customer).await;

    uuid
}
