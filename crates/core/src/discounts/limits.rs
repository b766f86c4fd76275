//! Validity windows and usage limits

use jiff::Timestamp;

/// Period during which a discount may be used. Unset bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    /// First instant the discount is valid.
    pub starts_at: Option<Timestamp>,

    /// Last instant the discount is valid.
    pub expires_at: Option<Timestamp>,
}

impl ValidityWindow {
    /// A window with no bounds.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            starts_at: None,
            expires_at: None,
        }
    }

    /// Whether `now` falls within the window (inclusive).
    pub fn contains(&self, now: Timestamp) -> bool {
        self.starts_at.is_none_or(|starts_at| starts_at <= now)
            && self.expires_at.is_none_or(|expires_at| now <= expires_at)
    }
}

/// Usage caps for a discount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageLimits {
    /// Maximum number of uses across all customers.
    pub usage_limit: Option<u32>,

    /// Maximum number of uses per customer.
    pub per_customer_limit: Option<u32>,

    /// Uses recorded so far.
    pub current_usage: u32,
}

impl UsageLimits {
    /// Create limits with no caps.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            usage_limit: None,
            per_customer_limit: None,
            current_usage: 0,
        }
    }

    /// Whether another use fits under the global cap.
    pub fn has_remaining(&self) -> bool {
        self.usage_limit
            .is_none_or(|limit| self.current_usage < limit)
    }

    /// Whether another use by a customer with `prior_uses` fits under the per-customer cap.
    pub fn customer_has_remaining(&self, prior_uses: u32) -> bool {
        self.per_customer_limit
            .is_none_or(|limit| prior_uses < limit)
    }

    /// Check if any cap is set.
    pub const fn has_constraints(&self) -> bool {
        self.usage_limit.is_some() || self.per_customer_limit.is_some()
    }
}
