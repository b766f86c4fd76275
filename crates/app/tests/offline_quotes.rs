//! Quoting fixture carts through the coupons service with in-memory storage

use jiff::Timestamp;
use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use rebate::fixtures::Fixture;
use rebate_app::{domain::coupons::CouponsService, offline::OfflineStore, receipt::write_quote};

fn fixtures() -> Fixture {
    Fixture::with_base_path("../core/fixtures")
}

// 2025-03-01 is a Saturday.
fn saturday() -> TestResult<Timestamp> {
    Ok("2025-03-01T10:00:00Z".parse()?)
}

async fn offline(customer: Option<&str>) -> TestResult<OfflineStore> {
    let fixtures = fixtures();
    let customer = customer.map(|name| fixtures.customer(name)).transpose()?;

    Ok(OfflineStore::load(
        fixtures.discounts("spring-sale")?,
        &fixtures.cart("sock-drawer")?,
        customer.as_ref(),
    )
    .await?)
}

#[tokio::test]
async fn guest_quote_matches_the_engine() -> TestResult {
    let shop = offline(None).await?;

    let quote = shop
        .context
        .coupons
        .quote_cart(shop.store, shop.cart, saturday()?)
        .await?;

    assert_eq!(quote.subtotal, Money::from_minor(6_600, GBP));
    assert_eq!(quote.stacking.total_discount, Money::from_minor(830, GBP));
    assert_eq!(quote.total(), Money::from_minor(5_770, GBP));
    assert_eq!(quote.free_gift_product_uuids.len(), 1);

    Ok(())
}

#[tokio::test]
async fn cart_customer_is_used_for_eligibility() -> TestResult {
    let shop = offline(Some("vip")).await?;

    let quote = shop
        .context
        .coupons
        .quote_cart(shop.store, shop.cart, saturday()?)
        .await?;

    let codes: Vec<&str> = quote
        .stacking
        .applied_discounts
        .iter()
        .map(|applied| applied.code.as_str())
        .collect();

    assert_eq!(codes, vec!["VIP-WEEKEND"]);
    assert_eq!(quote.stacking.total_discount, Money::from_minor(990, GBP));

    Ok(())
}

#[tokio::test]
async fn receipt_lists_each_discount_and_the_total() -> TestResult {
    let shop = offline(None).await?;

    let quote = shop
        .context
        .coupons
        .quote_cart(shop.store, shop.cart, saturday()?)
        .await?;

    let mut out = Vec::new();
    write_quote(&mut out, &quote)?;

    let receipt = String::from_utf8(out)?;

    assert!(receipt.contains("SOCKS-3-FOR-2"), "{receipt}");
    assert!(receipt.contains("£57.70"), "{receipt}");

    Ok(())
}
