use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Length of the billing period bought by a payment.
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
#[sqlx(type_name = "subscription_period", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl SubscriptionPeriod {
    pub fn months(&self) -> u32 {
        match self {
            SubscriptionPeriod::Monthly => 1,
            SubscriptionPeriod::Yearly => 12,
        }
    }

    /// Calendar end of a period starting at `start`. Month arithmetic clamps
    /// to the last day of shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn end_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_months(Months::new(self.months()))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
