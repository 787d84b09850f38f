use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Settlement state of a payment transaction.
///
/// A transaction is created `Pending` by an initiator and moved to `Success`
/// or `Failed` exactly once by a confirmer.
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
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }

    /// Terminal states are never overwritten by a later confirmation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }
}
