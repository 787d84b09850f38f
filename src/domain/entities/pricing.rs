use serde::Serialize;

use super::subscription_period::SubscriptionPeriod;

/// Subscription prices in minor currency units (piasters for EGP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    /// Introductory price charged for the very first month.
    pub first_subscription_cents: i64,
    /// Monthly renewal price.
    pub monthly_cents: i64,
    /// A yearly renewal costs this many monthly prices.
    pub yearly_multiplier: i64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            first_subscription_cents: 10_000,
            monthly_cents: 30_000,
            yearly_multiplier: 10,
        }
    }
}

impl Pricing {
    /// Amount owed for the next payment. The first subscription is always
    /// one introductory month regardless of the requested period.
    pub fn amount_due(&self, is_first_subscription: bool, period: SubscriptionPeriod) -> i64 {
        if is_first_subscription {
            return self.first_subscription_cents;
        }
        match period {
            SubscriptionPeriod::Monthly => self.monthly_cents,
            SubscriptionPeriod::Yearly => self.monthly_cents * self.yearly_multiplier,
        }
    }

    /// Period actually granted for a payment; first subscriptions are monthly.
    pub fn effective_period(
        &self,
        is_first_subscription: bool,
        requested: SubscriptionPeriod,
    ) -> SubscriptionPeriod {
        if is_first_subscription {
            SubscriptionPeriod::Monthly
        } else {
            requested
        }
    }
}

/// Whole currency units for display (30000 piasters -> 300).
pub fn to_major_units(amount_cents: i64) -> f64 {
    amount_cents as f64 / 100.0
}
