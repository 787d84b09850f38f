use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{
    payment_method::PaymentMethod, pricing::Pricing, subscription_period::SubscriptionPeriod,
    subscription_status::SubscriptionStatus,
};

/// Read-only window after `expires_at` during which the storefront stays live.
pub const GRACE_PERIOD_HOURS: i64 = 48;
/// The public storefront goes offline this long after `expires_at`.
pub const STOREFRONT_PAUSE_DAYS: i64 = 30;
/// Lifetime of the temporary access granted when a manual payment starts.
pub const PENDING_GRANT_HOURS: i64 = 24;
/// The dashboard shows a renewal warning when this few days remain.
pub const RENEWAL_WARNING_DAYS: i64 = 7;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// One row of the `subscriptions` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Denormalized hint written by the sweep. Never used for access checks.
    pub status: SubscriptionStatus,
    pub is_first_subscription: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub grace_ends_at: Option<DateTime<Utc>>,
    pub storefront_paused_at: Option<DateTime<Utc>>,
    pub pending_payment_method: Option<PaymentMethod>,
    pub pending_payment_at: Option<DateTime<Utc>>,
    pub pending_expires_at: Option<DateTime<Utc>>,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub paymob_order_id: Option<String>,
    pub amount_paid_cents: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    /// Which access mechanism currently governs this subscription.
    pub fn access_grant(&self) -> AccessGrant {
        match (self.expires_at, self.pending_expires_at) {
            (Some(expires_at), _) => AccessGrant::Durable {
                expires_at,
                grace_ends_at: self.grace_ends_at,
            },
            (None, Some(pending_expires_at)) => AccessGrant::Temporary { pending_expires_at },
            (None, None) => AccessGrant::Nothing,
        }
    }

    /// Whether the public storefront must stop serving customers.
    pub fn is_storefront_paused(&self, now: DateTime<Utc>) -> bool {
        self.storefront_paused_at
            .is_some_and(|paused_at| now > paused_at)
    }
}

/// Access mechanisms in precedence order: a durable billing window always
/// wins over a temporary manual-payment grant, which wins over nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    Durable {
        expires_at: DateTime<Utc>,
        grace_ends_at: Option<DateTime<Utc>>,
    },
    Temporary {
        pending_expires_at: DateTime<Utc>,
    },
    Nothing,
}

/// Dates written when a payment is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingWindow {
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub grace_ends_at: DateTime<Utc>,
    pub storefront_paused_at: DateTime<Utc>,
}

impl BillingWindow {
    /// Window starting at the moment of confirmation. Unused time from a
    /// previous window is not carried over.
    pub fn starting_at(now: DateTime<Utc>, period: SubscriptionPeriod) -> Self {
        let expires_at = period.end_from(now);
        Self {
            started_at: now,
            expires_at,
            grace_ends_at: expires_at + Duration::hours(GRACE_PERIOD_HOURS),
            storefront_paused_at: expires_at + Duration::days(STOREFRONT_PAUSE_DAYS),
        }
    }
}

/// Access state computed from a subscription row at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStatus {
    pub status: SubscriptionStatus,
    pub is_read_only: bool,
    pub days_remaining: Option<i64>,
    /// Amount owed for a monthly payment, in minor units.
    pub amount_due_cents: i64,
    /// Informational banner only; never blocks writes.
    pub show_renewal_warning: bool,
}

/// Computes the authoritative subscription state. Missing rows are read-only.
pub fn derive_status(
    subscription: Option<&SubscriptionRecord>,
    now: DateTime<Utc>,
    pricing: &Pricing,
) -> DerivedStatus {
    let Some(subscription) = subscription else {
        return DerivedStatus {
            status: SubscriptionStatus::Inactive,
            is_read_only: true,
            days_remaining: None,
            amount_due_cents: pricing.amount_due(true, SubscriptionPeriod::Monthly),
            show_renewal_warning: false,
        };
    };

    let amount_due_cents = pricing.amount_due(
        subscription.is_first_subscription,
        SubscriptionPeriod::Monthly,
    );

    let (status, days_remaining) = match subscription.access_grant() {
        AccessGrant::Durable {
            expires_at,
            grace_ends_at,
        } => {
            let days = days_until(expires_at, now);
            let status = if now <= expires_at {
                SubscriptionStatus::Active
            } else if grace_ends_at.is_some_and(|grace| now <= grace) {
                SubscriptionStatus::Grace
            } else {
                SubscriptionStatus::Expired
            };
            (status, Some(days))
        }
        AccessGrant::Temporary { pending_expires_at } if now <= pending_expires_at => {
            (SubscriptionStatus::Active, None)
        }
        AccessGrant::Temporary { .. } | AccessGrant::Nothing => {
            (SubscriptionStatus::Inactive, None)
        }
    };

    let show_renewal_warning = status.is_active()
        && days_remaining.is_some_and(|days| days <= RENEWAL_WARNING_DAYS);

    DerivedStatus {
        status,
        is_read_only: !status.is_active(),
        days_remaining,
        amount_due_cents,
        show_renewal_warning,
    }
}

/// Whole days until `target`, rounded up. Zero or negative once passed.
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (target - now).num_milliseconds();
    let days = millis / MILLIS_PER_DAY;
    if millis % MILLIS_PER_DAY > 0 {
        days + 1
    } else {
        days
    }
}
