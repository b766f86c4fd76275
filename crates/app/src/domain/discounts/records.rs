//! Discount Usage Records

use jiff::Timestamp;
use rebate::discounts::DiscountRecord;
use serde::Serialize;
use uuid::Uuid;

use crate::{domain::customers::CustomerUuid, uuids::TypedUuid};

/// Discount UUID
pub type DiscountUuid = TypedUuid<DiscountRecord>;

/// Usage UUID
pub type UsageUuid = TypedUuid<UsageRecord>;

/// Order marker for typed identifiers.
#[derive(Debug)]
pub struct Order;

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Request metadata stored with a usage record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageAudit {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// New Usage Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUsageRecord {
    pub uuid: UsageUuid,
    pub discount: DiscountUuid,
    pub order: OrderUuid,
    pub customer: Option<CustomerUuid>,
    /// Discount taken, in minor units
    pub discount_amount: i64,
    /// Order subtotal, in minor units
    pub order_subtotal: i64,
    pub currency: String,
    /// Products the discount targeted
    pub applied_product_uuids: Vec<Uuid>,
    pub audit: UsageAudit,
}

impl NewUsageRecord {
    #[must_use]
    pub fn into_record(self, created_at: Timestamp) -> UsageRecord {
        UsageRecord {
            uuid: self.uuid,
            discount: self.discount,
            order: self.order,
            customer: self.customer,
            discount_amount: self.discount_amount,
            order_subtotal: self.order_subtotal,
            currency: self.currency,
            applied_product_uuids: self.applied_product_uuids,
            audit: self.audit,
            created_at,
        }
    }
}

/// Usage Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub uuid: UsageUuid,
    pub discount: DiscountUuid,
    pub order: OrderUuid,
    pub customer: Option<CustomerUuid>,
    pub discount_amount: i64,
    pub order_subtotal: i64,
    pub currency: String,
    pub applied_product_uuids: Vec<Uuid>,
    pub audit: UsageAudit,
    pub created_at: Timestamp,
}
