use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::{
    payment_method::PaymentMethod, payment_status::PaymentStatus,
    subscription_period::SubscriptionPeriod,
};

/// Who settled a transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "confirmation_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfirmedBy {
    Gateway,
    Admin,
}

/// One row of the append-only `payment_transactions` ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub subscription_period: SubscriptionPeriod,
    pub status: PaymentStatus,
    pub paymob_order_id: Option<String>,
    pub paymob_transaction_id: Option<String>,
    pub telegram_message_id: Option<i64>,
    pub hmac_verified: bool,
    #[serde(skip_serializing)]
    pub raw_response: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub confirmed_by: Option<ConfirmedBy>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
