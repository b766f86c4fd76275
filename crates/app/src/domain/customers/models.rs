//! Customer Models

use rebate::context::CustomerSnapshot;
use uuid::Uuid;

use crate::uuids::TypedUuid;

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// Customer Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub uuid: CustomerUuid,
    pub group_uuids: Vec<Uuid>,
    pub total_orders: u32,
}

impl Customer {
    /// The customer as seen by discount rules and eligibility checks.
    #[must_use]
    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            id: self.uuid.into_uuid(),
            groups: self.group_uuids.iter().copied().collect(),
            total_orders: self.total_orders,
        }
    }
}
