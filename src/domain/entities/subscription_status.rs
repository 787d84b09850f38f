use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Lifecycle status of an owner's subscription.
///
/// The same enum is used for the denormalized `status` column refreshed by the
/// sweep and for the status derived on every request. Only the derived value
/// is used for access decisions.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    /// Never paid, or the temporary manual-payment grant lapsed.
    #[default]
    Inactive,
    /// Inside a paid billing window or a valid temporary grant.
    Active,
    /// Past `expires_at` but before `grace_ends_at`; dashboard is read-only.
    Grace,
    /// Past the grace window.
    Expired,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    /// Valid transitions for the stored status hint.
    pub fn valid_transitions(&self) -> &'static [SubscriptionStatus] {
        match self {
            SubscriptionStatus::Inactive => &[SubscriptionStatus::Active],
            SubscriptionStatus::Active => &[SubscriptionStatus::Active, SubscriptionStatus::Grace],
            SubscriptionStatus::Grace => &[SubscriptionStatus::Active, SubscriptionStatus::Expired],
            SubscriptionStatus::Expired => &[SubscriptionStatus::Active],
        }
    }

    pub fn can_transition_to(&self, new_status: SubscriptionStatus) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}
