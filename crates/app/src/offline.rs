//! Offline Stores
//!
//! Loads fixture files into in-memory repositories so a cart can be quoted
//! without a database.

use std::sync::Arc;

use rebate::{
    context::resolve_id,
    fixtures::{CartFixture, CustomerFixture, DiscountsFixture, FixtureError},
    money::major_to_minor,
};

use crate::{
    context::AppContext,
    domain::{
        carts::{Cart, CartItem, CartUuid, MemoryCartsRepository},
        customers::{Customer, CustomerUuid, MemoryCustomersRepository},
        discounts::MemoryDiscountsRepository,
        stores::StoreUuid,
    },
};

/// An application context over fixture data, with the loaded cart.
pub struct OfflineStore {
    pub context: AppContext,
    pub store: StoreUuid,
    pub cart: CartUuid,
    pub discounts: Arc<MemoryDiscountsRepository>,
}

impl OfflineStore {
    /// Load discounts, a cart and an optional customer into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if a cart price cannot be represented in minor units.
    pub async fn load(
        discounts: DiscountsFixture,
        cart: &CartFixture,
        customer: Option<&CustomerFixture>,
    ) -> Result<Self, FixtureError> {
        let store = StoreUuid::from_uuid(discounts.store_id());

        let discounts_repository = Arc::new(MemoryDiscountsRepository::new());
        let carts_repository = Arc::new(MemoryCartsRepository::new());
        let customers_repository = Arc::new(MemoryCustomersRepository::new());

        for record in discounts.discounts {
            discounts_repository.insert(store, record).await;
        }

        let customer = customer.map(|fixture| Customer {
            uuid: CustomerUuid::from_uuid(resolve_id(&fixture.id)),
            group_uuids: fixture.groups.iter().map(|group| resolve_id(group)).collect(),
            total_orders: fixture.total_orders,
        });

        let cart = Cart {
            uuid: CartUuid::now_v7(),
            customer: customer.as_ref().map(|customer| customer.uuid),
            currency: cart.currency.clone(),
            items: cart
                .items
                .iter()
                .map(|item| -> Result<CartItem, FixtureError> {
                    Ok(CartItem {
                        product_uuid: resolve_id(&item.product),
                        quantity: item.quantity,
                        unit_price: major_to_minor(item.price)?,
                        category_uuids: item
                            .categories
                            .iter()
                            .map(|category| resolve_id(category))
                            .collect(),
                        brand_uuid: item.brand.as_deref().map(resolve_id),
                    })
                })
                .collect::<Result<_, _>>()?,
            discount_codes: cart.discount_codes.clone(),
            shipping_country: cart.shipping_country.clone(),
        };

        let cart_uuid = cart.uuid;

        carts_repository.insert(store, cart).await;

        if let Some(customer) = customer {
            customers_repository.insert(store, customer).await;
        }

        Ok(Self {
            context: AppContext::from_repositories(
                discounts_repository.clone(),
                carts_repository,
                customers_repository,
            ),
            store,
            cart: cart_uuid,
            discounts: discounts_repository,
        })
    }
}
