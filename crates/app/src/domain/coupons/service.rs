//! Coupons Service

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{Timestamp, tz::TimeZone};
use mockall::automock;
use rebate::{
    context::{CartLine, DateTimeSnapshot, RuleContext},
    discounts::{DiscountDefinition, DiscountRecord, eligibility::Ineligibility},
    engine::PromotionEngine,
    promotions::PromotionDetails,
};
use rusty_money::{Money, iso::Currency};
use tracing::{Span, debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    RepositoryError,
    carts::{Cart, CartUuid, CartsRepository},
    coupons::{
        CouponsServiceError,
        models::{CartQuote, CouponOutcome, CouponRejection, OrderUsage},
        observer::TracingObserver,
    },
    customers::{Customer, CustomerUuid, CustomersRepository},
    discounts::{DiscountUuid, DiscountsRepository, NewUsageRecord, UsageRecord, UsageUuid},
    stores::StoreUuid,
};

type Definition = DiscountDefinition<'static>;

#[derive(Clone)]
pub struct CouponsApplicationService {
    discounts: Arc<dyn DiscountsRepository>,
    carts: Arc<dyn CartsRepository>,
    customers: Arc<dyn CustomersRepository>,
    engine: PromotionEngine<TracingObserver>,
}

impl CouponsApplicationService {
    #[must_use]
    pub fn new(
        discounts: Arc<dyn DiscountsRepository>,
        carts: Arc<dyn CartsRepository>,
        customers: Arc<dyn CustomersRepository>,
    ) -> Self {
        Self {
            discounts,
            carts,
            customers,
            engine: PromotionEngine::with_observer(TracingObserver),
        }
    }

    async fn load_cart(&self, store: StoreUuid, cart: CartUuid) -> Result<Cart, CouponsServiceError> {
        self.carts.get_cart(store, cart).await.map_err(|error| match error {
            RepositoryError::NotFound => CouponsServiceError::CartNotFound,
            error => CouponsServiceError::Storage(error),
        })
    }

    async fn load_customer(
        &self,
        store: StoreUuid,
        customer: Option<CustomerUuid>,
    ) -> Result<Option<Customer>, CouponsServiceError> {
        let Some(customer) = customer else {
            return Ok(None);
        };

        match self.customers.get_customer(store, customer).await {
            Ok(found) => Ok(Some(found)),
            Err(RepositoryError::NotFound) => Err(CouponsServiceError::CustomerNotFound),
            Err(error) => Err(CouponsServiceError::Storage(error)),
        }
    }

    /// Run the validation chain for one code against a loaded cart.
    async fn check_code(
        &self,
        store: StoreUuid,
        code: &str,
        cart: &Cart,
        customer: Option<&Customer>,
        now: Timestamp,
    ) -> Result<CouponOutcome<Box<Definition>>, CouponsServiceError> {
        let Some(record) = self.discounts.find_by_code(store, code).await? else {
            return Ok(CouponOutcome::Rejected(CouponRejection::NotFound));
        };

        let definition = record.into_definition(store.into_uuid(), cart.currency()?)?;
        let snapshot = cart.snapshot()?;

        if !definition.is_valid(now) {
            return Ok(CouponOutcome::Rejected(CouponRejection::NoLongerValid));
        }

        if !definition.has_remaining_usage() {
            return Ok(CouponOutcome::Rejected(CouponRejection::UsageLimitReached));
        }

        if !definition.meets_minimum_order(&snapshot.subtotal()) {
            let minimum = definition
                .minimum_order
                .map(|minimum| minimum.to_string())
                .unwrap_or_default();

            return Ok(CouponOutcome::Rejected(CouponRejection::MinimumOrder {
                minimum,
            }));
        }

        let customer_snapshot = customer.map(Customer::snapshot);

        match definition.check_customer(customer_snapshot.as_ref()) {
            Ok(()) => {}
            Err(Ineligibility::NotEligible) => {
                return Ok(CouponOutcome::Rejected(CouponRejection::NotEligible));
            }
            Err(Ineligibility::FirstOrderOnly) => {
                return Ok(CouponOutcome::Rejected(CouponRejection::FirstOrderOnly));
            }
        }

        if let Some(customer) = customer
            && definition.limits.per_customer_limit.is_some()
        {
            let prior = self
                .discounts
                .count_customer_usage(store, DiscountUuid::from_uuid(definition.id), customer.uuid)
                .await?;

            if !definition.limits.customer_has_remaining(prior) {
                return Ok(CouponOutcome::Rejected(CouponRejection::CustomerLimitReached));
            }
        }

        if !definition.applies_to_products(snapshot.items()) {
            return Ok(CouponOutcome::Rejected(CouponRejection::NoEligibleItems));
        }

        Ok(CouponOutcome::Accepted(Box::new(definition)))
    }

    /// Automatic discounts whose rules pass and whose eligibility admits the customer.
    async fn automatic_for(
        &self,
        store: StoreUuid,
        cart: &Cart,
        customer: Option<&Customer>,
        now: Timestamp,
    ) -> Result<Vec<Definition>, CouponsServiceError> {
        let currency = cart.currency()?;
        let records = self.discounts.list_automatic(store).await?;
        let definitions = resolve_all(store, records, currency);

        let customer_snapshot = customer.map(Customer::snapshot);

        let mut context = RuleContext::new()
            .with_cart(cart.snapshot()?)
            .with_datetime(DateTimeSnapshot::at(now, &TimeZone::UTC));

        if let Some(country) = &cart.shipping_country {
            context = context.with_shipping_country(country.clone());
        }

        if let Some(snapshot) = &customer_snapshot {
            context = context.with_customer(snapshot.clone());
        }

        Ok(self
            .engine
            .find_automatic_discounts(store.into_uuid(), &definitions, &context, now)
            .into_iter()
            .filter(|discount| discount.check_customer(customer_snapshot.as_ref()).is_ok())
            .cloned()
            .collect())
    }

    /// Keep the discounts worth something on this cart, and collect the
    /// products of qualified free gifts.
    fn split_free_gifts(
        &self,
        discounts: Vec<Definition>,
        items: &[CartLine<'static>],
        subtotal: Money<'static, Currency>,
    ) -> (Vec<Definition>, Vec<Uuid>) {
        let mut free_gifts = Vec::new();
        let mut amount_bearing = Vec::with_capacity(discounts.len());

        for discount in discounts {
            let outcome = self
                .engine
                .calculate_amount(&discount, &discount.targeted_lines(items), subtotal);

            if let Some(PromotionDetails::FreeGift {
                qualified: true,
                free_product_ids,
            }) = &outcome.details
            {
                free_gifts.extend(free_product_ids.iter().copied());
            }

            if outcome.amount.to_minor_units() > 0 {
                amount_bearing.push(discount);
            } else {
                debug!(discount_code = %discount.code, "discount is worth nothing on this cart");
            }
        }

        (amount_bearing, free_gifts)
    }
}

/// Resolve stored records, skipping any that cannot be used.
fn resolve_all(
    store: StoreUuid,
    records: Vec<DiscountRecord>,
    currency: &'static Currency,
) -> Vec<Definition> {
    records
        .into_iter()
        .filter_map(|record| {
            let code = record.code.clone();

            record
                .into_definition(store.into_uuid(), currency)
                .inspect_err(|error| warn!(discount_code = %code, %error, "skipping invalid discount"))
                .ok()
        })
        .collect()
}

#[async_trait]
impl CouponsService for CouponsApplicationService {
    #[tracing::instrument(
        name = "coupons.service.validate_coupon",
        skip(self),
        fields(store_uuid = %store, cart_uuid = %cart, valid = tracing::field::Empty),
        err
    )]
    async fn validate_coupon(
        &self,
        store: StoreUuid,
        code: &str,
        cart: CartUuid,
        customer: Option<CustomerUuid>,
        now: Timestamp,
    ) -> Result<CouponOutcome<Box<Definition>>, CouponsServiceError> {
        let cart = self.load_cart(store, cart).await?;
        let customer = self.load_customer(store, customer).await?;

        let outcome = self
            .check_code(store, code, &cart, customer.as_ref(), now)
            .await?;

        Span::current().record("valid", outcome.is_accepted());

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "coupons.service.apply_coupon",
        skip(self),
        fields(store_uuid = %store, cart_uuid = %cart),
        err
    )]
    async fn apply_coupon(
        &self,
        store: StoreUuid,
        code: &str,
        cart: CartUuid,
        customer: Option<CustomerUuid>,
        now: Timestamp,
    ) -> Result<CouponOutcome<Vec<String>>, CouponsServiceError> {
        let cart = self.load_cart(store, cart).await?;
        let customer = self.load_customer(store, customer).await?;

        let definition = match self
            .check_code(store, code, &cart, customer.as_ref(), now)
            .await?
        {
            CouponOutcome::Accepted(definition) => definition,
            CouponOutcome::Rejected(rejection) => return Ok(CouponOutcome::Rejected(rejection)),
        };

        if cart.has_code(&definition.code) {
            return Ok(CouponOutcome::Rejected(CouponRejection::AlreadyApplied));
        }

        if !cart.discount_codes.is_empty() {
            if !definition.stacking.is_stackable {
                return Ok(CouponOutcome::Rejected(CouponRejection::CannotCombine));
            }

            for applied in &cart.discount_codes {
                if let Some(existing) = self.discounts.find_by_code(store, applied).await?
                    && !existing.is_stackable
                {
                    return Ok(CouponOutcome::Rejected(CouponRejection::CannotCombine));
                }
            }
        }

        let mut codes = cart.discount_codes.clone();
        codes.push(definition.code.clone());

        self.carts
            .update_discount_codes(store, cart.uuid, codes.clone())
            .await?;

        info!(discount_code = %definition.code, "applied discount code");

        Ok(CouponOutcome::Accepted(codes))
    }

    #[tracing::instrument(
        name = "coupons.service.remove_coupon",
        skip(self),
        fields(store_uuid = %store, cart_uuid = %cart),
        err
    )]
    async fn remove_coupon(
        &self,
        store: StoreUuid,
        code: &str,
        cart: CartUuid,
    ) -> Result<CouponOutcome<Vec<String>>, CouponsServiceError> {
        let cart = self.load_cart(store, cart).await?;

        if !cart.has_code(code) {
            return Ok(CouponOutcome::Rejected(CouponRejection::NotApplied));
        }

        let code = code.trim();
        let codes: Vec<String> = cart
            .discount_codes
            .iter()
            .filter(|applied| !applied.eq_ignore_ascii_case(code))
            .cloned()
            .collect();

        self.carts
            .update_discount_codes(store, cart.uuid, codes.clone())
            .await?;

        info!(discount_code = %code, "removed discount code");

        Ok(CouponOutcome::Accepted(codes))
    }

    #[tracing::instrument(
        name = "coupons.service.record_usage",
        skip(self, usage),
        fields(
            store_uuid = %store,
            order_uuid = %usage.order,
            code_count = usage.codes.len()
        ),
        err
    )]
    async fn record_usage(
        &self,
        store: StoreUuid,
        usage: OrderUsage,
    ) -> Result<Vec<UsageRecord>, CouponsServiceError> {
        let currency = rebate::money::currency_from_code(&usage.currency)?;
        let subtotal = Money::from_minor(usage.order_subtotal, currency);
        let lines: Vec<CartLine<'static>> =
            usage.items.iter().map(|item| item.line(currency)).collect();

        let mut recorded = Vec::with_capacity(usage.codes.len());

        for code in &usage.codes {
            let record = self
                .discounts
                .find_by_code(store, code)
                .await?
                .ok_or_else(|| CouponsServiceError::DiscountNotFound(code.clone()))?;

            let definition = record.into_definition(store.into_uuid(), currency)?;
            let targeted = definition.targeted_lines(&lines);
            let outcome = self.engine.calculate_amount(&definition, &targeted, subtotal);

            let usage_record = self
                .discounts
                .record_usage(
                    store,
                    NewUsageRecord {
                        uuid: UsageUuid::now_v7(),
                        discount: DiscountUuid::from_uuid(definition.id),
                        order: usage.order,
                        customer: usage.customer,
                        discount_amount: outcome.amount.to_minor_units(),
                        order_subtotal: usage.order_subtotal,
                        currency: usage.currency.clone(),
                        applied_product_uuids: targeted.iter().map(CartLine::product).collect(),
                        audit: usage.audit.clone(),
                    },
                )
                .await
                .map_err(|error| match error {
                    RepositoryError::NotFound => CouponsServiceError::DiscountNotFound(code.clone()),
                    error => CouponsServiceError::Storage(error),
                })?;

            info!(
                discount_code = %definition.code,
                discount_amount = usage_record.discount_amount,
                "recorded discount usage"
            );

            recorded.push(usage_record);
        }

        Ok(recorded)
    }

    #[tracing::instrument(
        name = "coupons.service.get_automatic_discounts",
        skip(self),
        fields(store_uuid = %store, cart_uuid = %cart, found = tracing::field::Empty),
        err
    )]
    async fn get_automatic_discounts(
        &self,
        store: StoreUuid,
        cart: CartUuid,
        customer: Option<CustomerUuid>,
        now: Timestamp,
    ) -> Result<Vec<Definition>, CouponsServiceError> {
        let cart = self.load_cart(store, cart).await?;
        let customer = self.load_customer(store, customer).await?;

        let automatic = self
            .automatic_for(store, &cart, customer.as_ref(), now)
            .await?;

        Span::current().record("found", automatic.len());

        Ok(automatic)
    }

    #[tracing::instrument(
        name = "coupons.service.quote_cart",
        skip(self),
        fields(store_uuid = %store, cart_uuid = %cart, total_discount = tracing::field::Empty),
        err
    )]
    async fn quote_cart(
        &self,
        store: StoreUuid,
        cart: CartUuid,
        now: Timestamp,
    ) -> Result<CartQuote, CouponsServiceError> {
        let cart = self.load_cart(store, cart).await?;
        let customer = self.load_customer(store, cart.customer).await?;
        let snapshot = cart.snapshot()?;

        let mut discounts: Vec<Definition> = Vec::new();

        for code in &cart.discount_codes {
            match self
                .check_code(store, code, &cart, customer.as_ref(), now)
                .await?
            {
                CouponOutcome::Accepted(definition) => discounts.push(*definition),
                CouponOutcome::Rejected(rejection) => {
                    debug!(discount_code = %code, %rejection, "applied code no longer qualifies");
                }
            }
        }

        for automatic in self
            .automatic_for(store, &cart, customer.as_ref(), now)
            .await?
        {
            if !discounts.iter().any(|discount| discount.id == automatic.id) {
                discounts.push(automatic);
            }
        }

        let (discounts, free_gifts) =
            self.split_free_gifts(discounts, snapshot.items(), snapshot.subtotal());

        let stacking = self
            .engine
            .apply_stacking_logic(&discounts, snapshot.items(), snapshot.subtotal());

        Span::current().record("total_discount", stacking.total_discount.to_minor_units());

        Ok(CartQuote::new(cart.uuid, snapshot.subtotal(), stacking, free_gifts))
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Check whether a code can be used on a cart by a customer.
    async fn validate_coupon(
        &self,
        store: StoreUuid,
        code: &str,
        cart: CartUuid,
        customer: Option<CustomerUuid>,
        now: Timestamp,
    ) -> Result<CouponOutcome<Box<Definition>>, CouponsServiceError>;

    /// Validate a code and add it to the cart, returning the cart's codes.
    async fn apply_coupon(
        &self,
        store: StoreUuid,
        code: &str,
        cart: CartUuid,
        customer: Option<CustomerUuid>,
        now: Timestamp,
    ) -> Result<CouponOutcome<Vec<String>>, CouponsServiceError>;

    /// Remove a code from the cart, returning the cart's remaining codes.
    async fn remove_coupon(
        &self,
        store: StoreUuid,
        code: &str,
        cart: CartUuid,
    ) -> Result<CouponOutcome<Vec<String>>, CouponsServiceError>;

    /// Record one usage per code for a completed order.
    async fn record_usage(
        &self,
        store: StoreUuid,
        usage: OrderUsage,
    ) -> Result<Vec<UsageRecord>, CouponsServiceError>;

    /// Automatic discounts the cart and customer qualify for.
    async fn get_automatic_discounts(
        &self,
        store: StoreUuid,
        cart: CartUuid,
        customer: Option<CustomerUuid>,
        now: Timestamp,
    ) -> Result<Vec<Definition>, CouponsServiceError>;

    /// Stack the cart's applied codes with its automatic discounts.
    async fn quote_cart(
        &self,
        store: StoreUuid,
        cart: CartUuid,
        now: Timestamp,
    ) -> Result<CartQuote, CouponsServiceError>;
}

#[cfg(test)]
mod tests {
    use rebate::{
        context::resolve_id,
        discounts::{EligibilityMode, targeting::AppliesTo},
    };
    use rust_decimal::Decimal;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::MockCartsRepository,
            customers::MockCustomersRepository,
            discounts::{MockDiscountsRepository, OrderUuid, UsageAudit},
        },
        test::{
            TestContext,
            helpers::{add_discount, create_cart, create_customer, fixed, item, now, percentage},
        },
    };

    use super::*;

    fn rejection<T>(outcome: &CouponOutcome<T>) -> Option<CouponRejection> {
        outcome.rejection().cloned()
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        let outcome = ctx
            .coupons
            .validate_coupon(ctx.store, "NOPE", cart, None, now())
            .await?;

        assert_eq!(rejection(&outcome), Some(CouponRejection::NotFound));
        assert_eq!(outcome.message().as_deref(), Some("Discount code not found"));

        Ok(())
    }

    #[tokio::test]
    async fn codes_validate_ignoring_case() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        add_discount(&ctx, fixed("FIVEOFF", 5)).await;

        let outcome = ctx
            .coupons
            .validate_coupon(ctx.store, "fiveoff", cart, None, now())
            .await?;

        let definition = outcome.accepted().ok_or("FIVEOFF rejected")?;

        assert_eq!(definition.code, "FIVEOFF");

        Ok(())
    }

    #[tokio::test]
    async fn inactive_and_expired_codes_are_no_longer_valid() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        let mut inactive = fixed("PAUSED", 5);
        inactive.is_active = false;

        let mut expired = fixed("LASTYEAR", 5);
        expired.expires_at = Some("2024-12-31T23:59:59Z".parse()?);

        add_discount(&ctx, inactive).await;
        add_discount(&ctx, expired).await;

        for code in ["PAUSED", "LASTYEAR"] {
            let outcome = ctx
                .coupons
                .validate_coupon(ctx.store, code, cart, None, now())
                .await?;

            assert_eq!(rejection(&outcome), Some(CouponRejection::NoLongerValid), "{code}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn exhausted_codes_are_rejected() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        let mut limited = fixed("FIRST100", 5);
        limited.usage_limit = Some(100);
        limited.current_usage = 100;

        add_discount(&ctx, limited).await;

        let outcome = ctx
            .coupons
            .validate_coupon(ctx.store, "FIRST100", cart, None, now())
            .await?;

        assert_eq!(rejection(&outcome), Some(CouponRejection::UsageLimitReached));

        Ok(())
    }

    #[tokio::test]
    async fn below_minimum_order_reports_the_minimum() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 2, 10_00)]).await;

        let mut minimum = fixed("SPEND30", 5);
        minimum.minimum_order = Some(Decimal::from(30));

        add_discount(&ctx, minimum).await;

        let outcome = ctx
            .coupons
            .validate_coupon(ctx.store, "SPEND30", cart, None, now())
            .await?;

        assert!(matches!(
            rejection(&outcome),
            Some(CouponRejection::MinimumOrder { .. })
        ));
        assert!(
            outcome.message().is_some_and(|message| message.contains("£30.00")),
            "message should include the minimum: {:?}",
            outcome.message()
        );

        Ok(())
    }

    #[tokio::test]
    async fn group_restricted_codes_check_membership() -> TestResult {
        let ctx = TestContext::new();

        let mut vip_only = percentage("VIP15", 15);
        vip_only.customer_eligibility = EligibilityMode::SpecificGroups;
        vip_only.allowed_customer_group_ids = vec!["vip".to_string()];

        add_discount(&ctx, vip_only).await;

        let vip = create_customer(&ctx, 3, &["vip"]).await;
        let regular = create_customer(&ctx, 3, &["newsletter"]).await;

        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        let admitted = ctx
            .coupons
            .validate_coupon(ctx.store, "VIP15", cart, Some(vip), now())
            .await?;

        let refused = ctx
            .coupons
            .validate_coupon(ctx.store, "VIP15", cart, Some(regular), now())
            .await?;

        let guest = ctx
            .coupons
            .validate_coupon(ctx.store, "VIP15", cart, None, now())
            .await?;

        assert!(admitted.is_accepted());
        assert_eq!(rejection(&refused), Some(CouponRejection::NotEligible));
        assert_eq!(rejection(&guest), Some(CouponRejection::NotEligible));

        Ok(())
    }

    #[tokio::test]
    async fn first_order_codes_refuse_returning_customers() -> TestResult {
        let ctx = TestContext::new();

        let mut welcome = percentage("WELCOME10", 10);
        welcome.first_order_only = true;

        add_discount(&ctx, welcome).await;

        let returning = create_customer(&ctx, 4, &[]).await;
        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        let outcome = ctx
            .coupons
            .validate_coupon(ctx.store, "WELCOME10", cart, Some(returning), now())
            .await?;

        assert_eq!(rejection(&outcome), Some(CouponRejection::FirstOrderOnly));

        let guest = ctx
            .coupons
            .validate_coupon(ctx.store, "WELCOME10", cart, None, now())
            .await?;

        assert!(guest.is_accepted());

        Ok(())
    }

    #[tokio::test]
    async fn per_customer_limit_counts_prior_usage() -> TestResult {
        let ctx = TestContext::new();

        let mut once = fixed("ONCE", 5);
        once.per_customer_limit = Some(1);

        add_discount(&ctx, once).await;

        let customer = create_customer(&ctx, 1, &[]).await;
        let cart = create_cart(&ctx, Some(customer), vec![item("mug", 1, 10_00)]).await;

        ctx.coupons
            .record_usage(
                ctx.store,
                OrderUsage {
                    order: OrderUuid::now_v7(),
                    customer: Some(customer),
                    codes: vec!["ONCE".to_string()],
                    currency: "GBP".to_string(),
                    order_subtotal: 10_00,
                    items: vec![item("mug", 1, 10_00)],
                    audit: UsageAudit::default(),
                },
            )
            .await?;

        let outcome = ctx
            .coupons
            .validate_coupon(ctx.store, "ONCE", cart, Some(customer), now())
            .await?;

        assert_eq!(rejection(&outcome), Some(CouponRejection::CustomerLimitReached));

        Ok(())
    }

    #[tokio::test]
    async fn targeted_codes_need_a_matching_line() -> TestResult {
        let ctx = TestContext::new();

        let mut boots_only = percentage("BOOTS20", 20);
        boots_only.applies_to = AppliesTo::SpecificProducts;
        boots_only.included_ids = vec!["boots".to_string()];

        add_discount(&ctx, boots_only).await;

        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        let outcome = ctx
            .coupons
            .validate_coupon(ctx.store, "BOOTS20", cart, None, now())
            .await?;

        assert_eq!(rejection(&outcome), Some(CouponRejection::NoEligibleItems));

        Ok(())
    }

    #[tokio::test]
    async fn applying_twice_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        add_discount(&ctx, fixed("FIVEOFF", 5)).await;

        let first = ctx
            .coupons
            .apply_coupon(ctx.store, "fiveoff", cart, None, now())
            .await?;

        assert_eq!(first, CouponOutcome::Accepted(vec!["FIVEOFF".to_string()]));

        let second = ctx
            .coupons
            .apply_coupon(ctx.store, "FIVEOFF", cart, None, now())
            .await?;

        assert_eq!(rejection(&second), Some(CouponRejection::AlreadyApplied));

        Ok(())
    }

    #[tokio::test]
    async fn exclusive_codes_cannot_be_combined() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 4, 10_00)]).await;

        let mut stackable = fixed("STACK", 2);
        stackable.is_stackable = true;

        add_discount(&ctx, fixed("EXCLUSIVE", 5)).await;
        add_discount(&ctx, stackable).await;
        add_discount(&ctx, fixed("ALSO-EXCLUSIVE", 3)).await;

        ctx.coupons
            .apply_coupon(ctx.store, "EXCLUSIVE", cart, None, now())
            .await?;

        let after_exclusive = ctx
            .coupons
            .apply_coupon(ctx.store, "STACK", cart, None, now())
            .await?;

        assert_eq!(rejection(&after_exclusive), Some(CouponRejection::CannotCombine));

        ctx.coupons.remove_coupon(ctx.store, "EXCLUSIVE", cart).await?;
        ctx.coupons
            .apply_coupon(ctx.store, "STACK", cart, None, now())
            .await?;

        let exclusive_second = ctx
            .coupons
            .apply_coupon(ctx.store, "ALSO-EXCLUSIVE", cart, None, now())
            .await?;

        assert_eq!(rejection(&exclusive_second), Some(CouponRejection::CannotCombine));

        Ok(())
    }

    #[tokio::test]
    async fn removing_a_code_that_is_not_applied_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, None, vec![item("mug", 1, 10_00)]).await;

        let outcome = ctx.coupons.remove_coupon(ctx.store, "FIVEOFF", cart).await?;

        assert_eq!(rejection(&outcome), Some(CouponRejection::NotApplied));

        Ok(())
    }

    #[tokio::test]
    async fn coupon_lifecycle_records_exactly_one_usage() -> TestResult {
        let ctx = TestContext::new();
        let customer = create_customer(&ctx, 0, &[]).await;
        let items = vec![item("mug", 2, 12_50), item("tea", 1, 5_00)];
        let cart = create_cart(&ctx, Some(customer), items.clone()).await;

        add_discount(&ctx, percentage("SAVE10", 10)).await;

        for _ in 0..3 {
            let outcome = ctx
                .coupons
                .validate_coupon(ctx.store, "SAVE10", cart, Some(customer), now())
                .await?;

            assert!(outcome.is_accepted(), "validation should not consume usage");
        }

        let applied = ctx
            .coupons
            .apply_coupon(ctx.store, "SAVE10", cart, Some(customer), now())
            .await?;

        assert!(applied.is_accepted());

        let recorded = ctx
            .coupons
            .record_usage(
                ctx.store,
                OrderUsage {
                    order: OrderUuid::now_v7(),
                    customer: Some(customer),
                    codes: vec!["SAVE10".to_string()],
                    currency: "GBP".to_string(),
                    order_subtotal: 30_00,
                    items,
                    audit: UsageAudit {
                        ip_address: Some("203.0.113.7".to_string()),
                        user_agent: Some("checkout-test".to_string()),
                    },
                },
            )
            .await?;

        let removed = ctx.coupons.remove_coupon(ctx.store, "save10", cart).await?;

        assert_eq!(removed, CouponOutcome::Accepted(Vec::new()));

        let usages = ctx.discounts.usages(ctx.store).await;
        let stored = ctx
            .discounts
            .find_by_code(ctx.store, "SAVE10")
            .await?
            .ok_or("SAVE10 missing")?;

        assert_eq!(recorded.len(), 1);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages.first().map(|usage| usage.discount_amount), Some(3_00));
        assert_eq!(stored.current_usage, 1);

        Ok(())
    }

    #[tokio::test]
    async fn recording_an_unknown_code_is_an_error() -> TestResult {
        let ctx = TestContext::new();

        let result = ctx
            .coupons
            .record_usage(
                ctx.store,
                OrderUsage {
                    order: OrderUuid::now_v7(),
                    customer: None,
                    codes: vec!["DELETED".to_string()],
                    currency: "GBP".to_string(),
                    order_subtotal: 10_00,
                    items: Vec::new(),
                    audit: UsageAudit::default(),
                },
            )
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::DiscountNotFound(ref code)) if code == "DELETED"),
            "expected DiscountNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn automatic_discounts_skip_manual_and_ineligible() -> TestResult {
        let ctx = TestContext::new();

        let mut everyone = fixed("AUTO-ALL", 1);
        everyone.is_automatic = true;

        let mut first_order = fixed("AUTO-FIRST", 2);
        first_order.is_automatic = true;
        first_order.first_order_only = true;

        add_discount(&ctx, everyone).await;
        add_discount(&ctx, first_order).await;
        add_discount(&ctx, fixed("MANUAL", 3)).await;

        let returning = create_customer(&ctx, 2, &[]).await;
        let cart = create_cart(&ctx, Some(returning), vec![item("mug", 1, 10_00)]).await;

        let found: Vec<String> = ctx
            .coupons
            .get_automatic_discounts(ctx.store, cart, Some(returning), now())
            .await?
            .into_iter()
            .map(|discount| discount.code)
            .collect();

        assert_eq!(found, vec!["AUTO-ALL"]);

        Ok(())
    }

    #[tokio::test]
    async fn quote_lists_free_gifts_outside_the_stacking_pass() -> TestResult {
        let ctx = TestContext::new();

        let mut five_off = fixed("FIVEOFF", 5);
        five_off.is_stackable = true;
        five_off.priority = 10;

        let mut gift = fixed("TOTE", 0);
        gift.is_automatic = true;
        gift.is_stackable = true;
        gift.priority = 20;
        gift.promotion_type = Some("free_gift".to_string());
        gift.target_config = Some(json!({
            "free_product_ids": ["tote-bag"],
            "minimum_purchase": 20
        }));

        add_discount(&ctx, five_off).await;
        add_discount(&ctx, gift).await;

        let cart = create_cart(&ctx, None, vec![item("mug", 3, 10_00)]).await;

        ctx.coupons
            .apply_coupon(ctx.store, "FIVEOFF", cart, None, now())
            .await?;

        let quote = ctx.coupons.quote_cart(ctx.store, cart, now()).await?;

        let codes: Vec<&str> = quote
            .stacking
            .applied_discounts
            .iter()
            .map(|applied| applied.code.as_str())
            .collect();

        assert_eq!(codes, vec!["FIVEOFF"]);
        assert_eq!(quote.stacking.total_discount.to_minor_units(), 5_00);
        assert_eq!(quote.total().to_minor_units(), 25_00);
        assert_eq!(quote.free_gift_product_uuids, vec![resolve_id("tote-bag")]);

        Ok(())
    }

    #[tokio::test]
    async fn worthless_promotions_do_not_block_applied_codes() -> TestResult {
        let ctx = TestContext::new();

        let mut tea_set = percentage("TEA-SET", 20);
        tea_set.is_automatic = true;
        tea_set.promotion_type = Some("bundle".to_string());
        tea_set.target_config = Some(json!({ "required_products": ["mug", "saucer"] }));

        let mut five_off = fixed("FIVEOFF", 5);
        five_off.priority = 10;

        add_discount(&ctx, tea_set).await;
        add_discount(&ctx, five_off).await;

        let cart = create_cart(&ctx, None, vec![item("mug", 3, 10_00)]).await;

        ctx.coupons
            .apply_coupon(ctx.store, "FIVEOFF", cart, None, now())
            .await?;

        let quote = ctx.coupons.quote_cart(ctx.store, cart, now()).await?;

        let applied: Vec<(&str, i64)> = quote
            .stacking
            .applied_discounts
            .iter()
            .map(|applied| (applied.code.as_str(), applied.amount.to_minor_units()))
            .collect();

        assert_eq!(applied, vec![("FIVEOFF", 5_00)]);
        assert_eq!(quote.total().to_minor_units(), 25_00);

        Ok(())
    }

    #[tokio::test]
    async fn quoted_and_recorded_amounts_agree_for_targeted_promotions() -> TestResult {
        let ctx = TestContext::new();

        let mut socks = percentage("SOCKS-3-FOR-2", 0);
        socks.is_automatic = true;
        socks.applies_to = AppliesTo::SpecificProducts;
        socks.included_ids = vec!["sock".to_string()];
        socks.promotion_type = Some("buy_x_get_y".to_string());
        socks.target_config = Some(json!({
            "buy_quantity": 2,
            "get_quantity": 1,
            "get_discount_percent": 100
        }));

        add_discount(&ctx, socks).await;

        let items = vec![item("sock", 3, 5_00), item("keyring", 1, 1_00)];
        let cart = create_cart(&ctx, None, items.clone()).await;

        let quote = ctx.coupons.quote_cart(ctx.store, cart, now()).await?;

        let recorded = ctx
            .coupons
            .record_usage(
                ctx.store,
                OrderUsage {
                    order: OrderUuid::now_v7(),
                    customer: None,
                    codes: vec!["SOCKS-3-FOR-2".to_string()],
                    currency: "GBP".to_string(),
                    order_subtotal: 16_00,
                    items,
                    audit: UsageAudit::default(),
                },
            )
            .await?;

        let recorded: Vec<i64> = recorded.iter().map(|usage| usage.discount_amount).collect();

        assert_eq!(quote.stacking.total_discount.to_minor_units(), 5_00);
        assert_eq!(recorded, vec![5_00]);

        Ok(())
    }

    fn service(
        discounts: MockDiscountsRepository,
        carts: MockCartsRepository,
        customers: MockCustomersRepository,
    ) -> CouponsApplicationService {
        CouponsApplicationService::new(Arc::new(discounts), Arc::new(carts), Arc::new(customers))
    }

    #[tokio::test]
    async fn missing_cart_is_reported() {
        let mut carts = MockCartsRepository::new();

        carts
            .expect_get_cart()
            .returning(|_, _| Err(RepositoryError::NotFound));

        let result = service(MockDiscountsRepository::new(), carts, MockCustomersRepository::new())
            .validate_coupon(StoreUuid::now_v7(), "ANY", CartUuid::now_v7(), None, now())
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::CartNotFound)),
            "expected CartNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn missing_customer_is_reported() {
        let mut carts = MockCartsRepository::new();
        let mut customers = MockCustomersRepository::new();

        carts.expect_get_cart().returning(|_, cart| {
            Ok(Cart {
                uuid: cart,
                customer: None,
                currency: "GBP".to_string(),
                items: Vec::new(),
                discount_codes: Vec::new(),
                shipping_country: None,
            })
        });

        customers
            .expect_get_customer()
            .returning(|_, _| Err(RepositoryError::NotFound));

        let result = service(MockDiscountsRepository::new(), carts, customers)
            .get_automatic_discounts(
                StoreUuid::now_v7(),
                CartUuid::now_v7(),
                Some(CustomerUuid::now_v7()),
                now(),
            )
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::CustomerNotFound)),
            "expected CustomerNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let mut discounts = MockDiscountsRepository::new();

        discounts
            .expect_find_by_code()
            .returning(|_, _| Err(RepositoryError::Sql(sqlx::Error::PoolTimedOut)));

        let result = service(discounts, MockCartsRepository::new(), MockCustomersRepository::new())
            .record_usage(
                StoreUuid::now_v7(),
                OrderUsage {
                    order: OrderUuid::now_v7(),
                    customer: None,
                    codes: vec!["ANY".to_string()],
                    currency: "GBP".to_string(),
                    order_subtotal: 10_00,
                    items: Vec::new(),
                    audit: UsageAudit::default(),
                },
            )
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::Storage(RepositoryError::Sql(_)))),
            "expected a storage error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn usage_is_not_recorded_when_the_increment_fails() {
        let mut discounts = MockDiscountsRepository::new();

        discounts
            .expect_find_by_code()
            .returning(|_, code| Ok(Some(fixed(code, 5))));

        discounts
            .expect_record_usage()
            .times(1)
            .returning(|_, _| Err(RepositoryError::NotFound));

        let result = service(discounts, MockCartsRepository::new(), MockCustomersRepository::new())
            .record_usage(
                StoreUuid::now_v7(),
                OrderUsage {
                    order: OrderUuid::now_v7(),
                    customer: None,
                    codes: vec!["GONE".to_string()],
                    currency: "GBP".to_string(),
                    order_subtotal: 10_00,
                    items: Vec::new(),
                    audit: UsageAudit::default(),
                },
            )
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::DiscountNotFound(_))),
            "expected DiscountNotFound, got {result:?}"
        );
    }
}
