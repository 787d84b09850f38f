use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How the owner pays for a billing period.
#[derive(
    Debug,
    Clone,
    Copy,
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
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentMethod {
    /// Card payment through the gateway's hosted checkout.
    Card,
    /// InstaPay transfer, confirmed by an admin.
    Instapay,
    /// Vodafone Cash wallet transfer, confirmed by an admin.
    Vodafone,
}

impl PaymentMethod {
    /// Manual methods are settled by a human through the admin chat.
    pub fn is_manual(&self) -> bool {
        matches!(self, PaymentMethod::Instapay | PaymentMethod::Vodafone)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Card",
            PaymentMethod::Instapay => "InstaPay",
            PaymentMethod::Vodafone => "Vodafone Cash",
        }
    }
}
