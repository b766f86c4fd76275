//! Customer eligibility

use rustc_hash::FxHashSet;

use crate::context::{CustomerGroupId, CustomerId, CustomerSnapshot};

/// Which customers may use a discount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CustomerEligibility {
    /// Anyone.
    #[default]
    All,

    /// Customers with no completed orders. Guests count as new.
    NewCustomersOnly,

    /// Members of at least one listed group.
    SpecificGroups(FxHashSet<CustomerGroupId>),

    /// Listed customers.
    SpecificCustomers(FxHashSet<CustomerId>),
}

impl CustomerEligibility {
    /// Stored name of the eligibility mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NewCustomersOnly => "new_customers_only",
            Self::SpecificGroups(_) => "specific_groups",
            Self::SpecificCustomers(_) => "specific_customers",
        }
    }

    /// Whether the customer (or a guest, when `None`) may use the discount.
    pub fn admits(&self, customer: Option<&CustomerSnapshot>) -> bool {
        match self {
            Self::All => true,
            Self::NewCustomersOnly => customer.is_none_or(CustomerSnapshot::is_new),
            Self::SpecificGroups(groups) => customer.is_some_and(|customer| {
                customer.groups.iter().any(|group| groups.contains(group))
            }),
            Self::SpecificCustomers(customers) => {
                customer.is_some_and(|customer| customers.contains(&customer.id))
            }
        }
    }
}

/// Why a customer cannot use a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    /// Excluded by the eligibility mode.
    NotEligible,

    /// The discount is for a first order and the customer has ordered before.
    FirstOrderOnly,
}

#[cfg(test)]
mod tests {
    use crate::context::resolve_id;

    use super::*;

    fn customer(total_orders: u32, groups: &[&str]) -> CustomerSnapshot {
        CustomerSnapshot {
            id: resolve_id("alice"),
            groups: groups.iter().map(|group| resolve_id(group)).collect(),
            total_orders,
        }
    }

    #[test]
    fn new_customers_only_admits_guests_and_first_timers() {
        let eligibility = CustomerEligibility::NewCustomersOnly;

        assert!(eligibility.admits(None));
        assert!(eligibility.admits(Some(&customer(0, &[]))));
        assert!(!eligibility.admits(Some(&customer(1, &[]))));
    }

    #[test]
    fn groups_require_membership() {
        let eligibility =
            CustomerEligibility::SpecificGroups([resolve_id("vip")].into_iter().collect());

        assert!(eligibility.admits(Some(&customer(4, &["staff", "vip"]))));
        assert!(!eligibility.admits(Some(&customer(4, &["staff"]))));
        assert!(!eligibility.admits(None));
    }

    #[test]
    fn specific_customers_match_by_id() {
        let eligibility =
            CustomerEligibility::SpecificCustomers([resolve_id("alice")].into_iter().collect());

        assert!(eligibility.admits(Some(&customer(0, &[]))));
        assert!(!eligibility.admits(None));
    }
}
